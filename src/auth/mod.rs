pub mod key_store;
