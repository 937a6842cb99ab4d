mod cache_storage_port;
mod key_value_port;
mod network_port;
mod object_storage_port;
mod transcoder_port;

pub use cache_storage_port::CacheStoragePort;
pub use key_value_port::KeyValuePort;
pub use network_port::NetworkPort;
pub use object_storage_port::ObjectStoragePort;
pub use transcoder_port::TranscoderPort;

#[cfg(test)]
pub mod mocks {
    pub use super::network_port::mock::MockNetwork;
    pub use super::object_storage_port::mock::MockObjectStorage;
}
