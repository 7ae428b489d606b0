pub mod extractor;
pub mod mapper;
pub mod resolver;
pub mod synonyms;
pub mod validator;
