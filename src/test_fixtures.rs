/// Shared report fixtures for unit tests
pub const HEADER: &str = "S.No,Start Time,End Time,Device IP Address,Threat Category,Attack Name,Policy Name,Action,\
Attack ID,Source IP Address,Source Port,Destination IP Address,Destination Port,Direction,Protocol,Radware ID,\
Duration,Total Packets,Total Packets Dropped,Packet Type,Total Mbits,Total Mbits Dropped,Max pps,Max bps,\
Physical Port,Risk,VLAN Tag,Footprint,,";

pub const DATA: &str = "1,03.14.2024 00:09:35,03.14.2024 00:12:10,10.1.1.1,DOSShield,SYN Flood,web_pol,Drop,\
34-1710374975,Multiple,Multiple,192.168.1.10,80,In,TCP,200000,155,1200,1100,Regular,5,4,800,3000,T-1,High,0,\
flags=SYN,,";

pub const DETAILS: &str = "Footprint,\"[flags=SYN, ttl=64]\"
State,Burst
Source IP,10.0.0.10,10.0.0.2,2.2.2.2,10.0.0.2
Source Port,1024,80,1024
Destination IP,192.168.1.10
Destination Port,80";

pub const SAMPLE_HEADER: &str =
    "Source IP, Source Port, Destination IP, Destination Port, Physical Port, VLAN Tag, MPLS RD, Protocol";

pub const SAMPLES: &str = "10.0.0.2,1024,192.168.1.10,80,T-1,0,,TCP
10.0.0.10,2048,192.168.1.10,80,T-1,0,,TCP";

pub fn fence() -> String {
    "*".repeat(69)
}

/// A complete, well-formed entry block
pub fn well_formed_entry() -> String {
    format!("{}\n{}\n{}\nSAMPLE DETAILS:,,\n{}\n{}", HEADER, DATA, DETAILS, SAMPLE_HEADER, SAMPLES)
}

/// Join entry blocks into a document, fenced the way reports are
pub fn document(entries: &[&str]) -> String {
    let fence = format!("\n{},,\n", fence());
    format!("{}{}", entries.join(&fence), fence)
}
