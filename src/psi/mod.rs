pub mod descriptor;
pub mod eit;
pub mod nit;
pub mod pat;
pub mod sdt;
pub mod section;

pub use descriptor::{Descriptor, DescriptorIter};
pub use eit::{parse_eit, EitSection, EventItem};
pub use nit::{parse_nit, NitSection, ServiceType};
pub use pat::{parse_pat, PatEntry, PatSection};
pub use sdt::{parse_sdt, SdtSection, SdtService};
pub use section::{Section, SectionHeader, TableFamily};
