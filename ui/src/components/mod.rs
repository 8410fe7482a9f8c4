pub mod app;
pub mod compose_form;
#[cfg(all(target_family = "wasm", feature = "use-wallet"))]
pub mod eip1193;
pub mod portal_api;
pub mod portal_state;
pub mod wave_list;
