pub mod config;
pub mod nunit;
pub mod security;
pub mod testrail;
