// ==========================================
// ERP → 数据仓库同步 - 抽取层
// ==========================================
// 职责: 读取源系统抽取数据, 映射为强类型行
// 支持: CSV, Excel
// ==========================================

pub mod data_cleaner;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod records;
pub mod source;
pub mod traits;

// 重导出核心类型
pub use data_cleaner::DataCleaner;
pub use error::{ExtractError, ExtractResult};
pub use field_mapper::FieldMapper;
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use records::{ReleasedOrderRow, SampleOrderRow};
pub use source::{FileExtractSource, RELEASED_ORDERS_FILE, SAMPLE_ORDERS_FILE};
pub use traits::{ErpSource, FileParser, RawRow};
