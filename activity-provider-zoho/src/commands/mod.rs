pub mod delete_record;
pub mod get_record;
pub mod insert_record;
pub mod list_records;
pub mod org_variables;
pub mod search_records;
pub mod update_record;
pub mod users;
