pub mod credential_cache;
