//! 连接串解析结果的数据契约。
//!
//! 解析器本身是外部协作方；本模块只定义其产出的只读数据形态，以及
//! “同名选项取最后一个值”的读取约定。

use std::collections::BTreeMap;

/// 单个目标地址。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Address {
    /// 主机名或 IP。
    pub host: String,
    /// 端口；`0` 表示由实现选择默认端口。
    pub port: u16,
}

/// 连接串解析产物：scheme、目标列表与原始选项表。
///
/// # 契约说明（What）
/// - `options` 保留每个键的全部出现值，读取方按需取最后一个
///   （[`ConnSpec::last_option`]），与解析器保持“不丢信息”的分工；
/// - 本层只读取已识别的超时覆盖键，未识别键原样忽略。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConnSpec {
    /// 连接 scheme（如 `coral`、`corals`）。
    pub scheme: String,
    /// 初始目标列表。
    pub hosts: Vec<Address>,
    /// 选项名到值列表的映射。
    pub options: BTreeMap<String, Vec<String>>,
}

impl ConnSpec {
    /// 按“最后一个值生效”的约定读取选项。
    pub fn last_option(&self, name: &str) -> Option<&str> {
        self.options
            .get(name)
            .and_then(|values| values.last())
            .map(String::as_str)
    }
}
