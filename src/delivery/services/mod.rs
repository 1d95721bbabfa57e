//! Delivery orchestration services.

mod bridge;
mod dispatcher;
mod gateway;
mod registry;

pub use bridge::DeliveryBridge;
pub use dispatcher::{
    BridgeRecordHandler, DEFAULT_CHANNEL_CAPACITY, DeliveryCommand, DeliveryDispatcher,
    DeliveryHandle,
};
pub use gateway::{ChatGateway, GATEWAY_SOURCE, UPLOAD_SOURCE};
pub use registry::ConnectionRegistry;
