pub mod commit;
pub mod field_mapper;
pub mod import_parser;
pub mod import_session;
pub mod row_validator;
