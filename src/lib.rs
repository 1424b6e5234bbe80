//! Backend multiempresa: catálogo de menus, empresas e filiais, cargos com
//! permissões por seção/módulo/submódulo, usuários e horários.

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
