//! # 路径规范化模块
//!
//! CHP 文件中的位图路径相对于 CHP 文件所在目录，可能使用 `\` 分隔符。
//! 所有读取都先经过这里转换为**逻辑路径**（`/` 分隔，无 `.` 与 `..`）。

/// 规范化逻辑路径
///
/// - 统一使用 `/` 分隔符
/// - 去掉 `.` 组件与空组件
/// - `..` 弹出上一级（越过根目录时忽略）
///
/// # 示例
///
/// ```ignore
/// assert_eq!(normalize_logical_path(".\\chara\\body.bmp"), "chara/body.bmp");
/// assert_eq!(normalize_logical_path("a/../b.bmp"), "b.bmp");
/// ```
pub fn normalize_logical_path(path: &str) -> String {
    let normalized = path.replace('\\', "/");

    let mut components = Vec::new();
    for component in normalized.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                components.pop();
            }
            _ => components.push(component),
        }
    }

    components.join("/")
}
