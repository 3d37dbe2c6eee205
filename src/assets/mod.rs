pub mod decode;
pub mod fontdb;
