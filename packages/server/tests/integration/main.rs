mod common;

mod application;
mod auth;
