/// 风格目录与 `/prompts`
pub mod styles;

/// 上传图片 -> 线稿压缩包
pub mod coloring;

/// 健康检查
pub mod health;
