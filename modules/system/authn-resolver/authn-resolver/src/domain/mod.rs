pub mod authenticator;
pub mod claims;
pub mod store;
pub mod validator;
