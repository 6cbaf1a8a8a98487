pub mod common;

mod credential_store;
