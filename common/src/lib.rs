pub mod abi;
pub mod bridge;
pub mod config;
pub mod contract;
pub mod portal_state;
pub mod relative_time;
pub mod session;
pub mod view;
pub mod wave;

#[cfg(any(test, feature = "dev"))]
pub mod mock_bridge;
