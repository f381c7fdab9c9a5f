// ==========================================
// 集成测试共享辅助模块
// ==========================================
// 各测试文件通过 `mod helpers;` 引入，未用到的辅助函数不报警
// ==========================================

#![allow(dead_code)]

pub mod mock_config;
pub mod mock_predictor;
pub mod test_data_builder;
pub mod test_db;
