pub mod app;
pub mod config;
pub mod error;
pub mod testing;
pub mod api {
    pub mod crud;
    pub mod delete;
    pub mod deploy;
    pub mod errors;
}
pub mod auth {
    pub mod guard;
    pub mod login;
    pub mod session;
}
pub mod db {
    pub mod entity;
    pub mod models;
    pub mod repository;
}
pub mod forms;
pub mod storage {
    pub mod client;
}
