pub mod clash_output;
pub mod proxy_group_output;
