pub mod builder;
pub mod error;
pub mod policy;
pub mod relay;
pub mod store;

pub use builder::{synthesize, ArtifactSource};
pub use error::{LookupError, SynthError, SynthResult};
pub use relay::{PublishedIpRanges, RelayRangeSource, StaticRelayRanges};
pub use store::{MemoryStore, ObjectStore, StoreError};
