mod member_repo_mysql;

pub use member_repo_mysql::*;
