// 外部協作者的實作：ERP、參考目錄與輸出儲存

pub mod bom_file;
pub mod catalog;
pub mod odoo;
pub mod storage;

pub use bom_file::BomFileSource;
pub use catalog::InMemoryCatalog;
pub use odoo::OdooClient;
pub use storage::LocalStorage;
