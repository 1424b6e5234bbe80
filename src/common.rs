pub mod db_utils;
pub mod error;
pub mod normalize;
pub mod pagination;
