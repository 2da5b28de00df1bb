//! 模板参数
//!
//! 模板 XML 中每个子节点的文本都会被转换成一个带类型的值

use crate::error::ParamError;
use std::collections::BTreeMap;

/// 参数值
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Float(f64),
    List(Vec<String>),
    /// 空文本（如 `<forces_file />`）
    Absent,
}

impl ParamValue {
    /// 把节点文本转换为参数值
    ///
    /// 优先级: 布尔 > 浮点数 > 空 > 词列表
    pub fn from_text(text: Option<&str>) -> Self {
        let Some(text) = text else {
            return ParamValue::Absent;
        };
        let trimmed = text.trim();
        match trimmed {
            "" => ParamValue::Absent,
            "true" => ParamValue::Bool(true),
            "false" => ParamValue::Bool(false),
            _ => match trimmed.parse::<f64>() {
                Ok(value) => ParamValue::Float(value),
                Err(_) => ParamValue::List(tokenize(trimmed)),
            },
        }
    }

    fn type_name(&self) -> String {
        match self {
            ParamValue::Bool(b) => format!("布尔值 {}", b),
            ParamValue::Float(v) => format!("数值 {}", v),
            ParamValue::List(items) => format!("列表 {:?}", items),
            ParamValue::Absent => "空".to_string(),
        }
    }
}

/// 按空白切分，连续空白不会产生空词
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// 参数表：节点名 → 参数值
///
/// 由某个分析节点构建，之后只读
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct ParameterMap {
    node: String,
    values: BTreeMap<String, ParamValue>,
    /// 数值参数的原始文本，名称列表需要原样使用
    #[serde(skip)]
    raw: BTreeMap<String, String>,
}

impl ParameterMap {
    pub fn new(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            values: BTreeMap::new(),
            raw: BTreeMap::new(),
        }
    }

    /// 所属的分析节点
    pub fn node(&self) -> &str {
        &self.node
    }

    pub fn insert(&mut self, key: impl Into<String>, value: ParamValue) {
        let key = key.into();
        self.raw.remove(&key);
        self.values.insert(key, value);
    }

    /// 按节点文本插入
    pub fn insert_text(&mut self, key: impl Into<String>, text: &str) {
        let key = key.into();
        let value = ParamValue::from_text(Some(text));
        if matches!(value, ParamValue::Float(_)) {
            self.raw.insert(key.clone(), text.trim().to_string());
        } else {
            self.raw.remove(&key);
        }
        self.values.insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn require(&self, key: &str) -> Result<&ParamValue, ParamError> {
        self.values.get(key).ok_or_else(|| ParamError::Missing {
            node: self.node.clone(),
            key: key.to_string(),
        })
    }

    fn wrong_type(&self, key: &str, expected: &'static str, found: &ParamValue) -> ParamError {
        ParamError::WrongType {
            node: self.node.clone(),
            key: key.to_string(),
            expected,
            found: found.type_name(),
        }
    }

    pub fn bool(&self, key: &str) -> Result<bool, ParamError> {
        match self.require(key)? {
            ParamValue::Bool(b) => Ok(*b),
            other => Err(self.wrong_type(key, "布尔值", other)),
        }
    }

    pub fn float(&self, key: &str) -> Result<f64, ParamError> {
        match self.require(key)? {
            ParamValue::Float(v) => Ok(*v),
            other => Err(self.wrong_type(key, "数值", other)),
        }
    }

    /// 整数参数（模板中以浮点数形式保存，截断取整）
    pub fn integer(&self, key: &str) -> Result<i64, ParamError> {
        self.float(key).map(|v| v as i64)
    }

    /// 名称列表；单个数字名称（如坐标名 "1"）也按列表处理
    pub fn list(&self, key: &str) -> Result<Vec<String>, ParamError> {
        match self.require(key)? {
            ParamValue::List(items) => Ok(items.clone()),
            ParamValue::Float(v) => Ok(vec![self
                .raw
                .get(key)
                .cloned()
                .unwrap_or_else(|| v.to_string())]),
            other => Err(self.wrong_type(key, "名称列表", other)),
        }
    }

    /// 可选文本：缺失或为空时返回 None
    pub fn optional_text(&self, key: &str) -> Result<Option<String>, ParamError> {
        match self.values.get(key) {
            None | Some(ParamValue::Absent) => Ok(None),
            Some(ParamValue::List(items)) if items.is_empty() => Ok(None),
            Some(ParamValue::List(items)) => Ok(Some(items.join(" "))),
            Some(other) => Err(self.wrong_type(key, "文本", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_text_never_becomes_string() {
        assert_eq!(ParamValue::from_text(Some("true")), ParamValue::Bool(true));
        assert_eq!(ParamValue::from_text(Some("false")), ParamValue::Bool(false));
    }

    #[test]
    fn test_numeric_text_becomes_float() {
        assert_eq!(ParamValue::from_text(Some("2")), ParamValue::Float(2.0));
        assert_eq!(ParamValue::from_text(Some("0.0001")), ParamValue::Float(0.0001));
        assert_eq!(ParamValue::from_text(Some(" 1e-3 ")), ParamValue::Float(1e-3));
        assert_eq!(ParamValue::from_text(Some("-1")), ParamValue::Float(-1.0));
    }

    #[test]
    fn test_missing_text_is_absent() {
        assert_eq!(ParamValue::from_text(None), ParamValue::Absent);
        assert_eq!(ParamValue::from_text(Some("")), ParamValue::Absent);
        assert_eq!(ParamValue::from_text(Some("  \n ")), ParamValue::Absent);
    }

    #[test]
    fn test_leading_spaces_trimmed_before_tokenizing() {
        assert_eq!(
            ParamValue::from_text(Some("   a b c")),
            ParamValue::List(vec!["a".into(), "b".into(), "c".into()])
        );
    }

    #[test]
    fn test_interior_space_runs_produce_no_empty_tokens() {
        assert_eq!(tokenize("ground_pelvis   hip_r\tknee_r"), vec!["ground_pelvis", "hip_r", "knee_r"]);
    }

    #[test]
    fn test_typed_accessors() {
        let mut params = ParameterMap::new("StaticOptimization");
        params.insert("on", ParamValue::Bool(true));
        params.insert("step_interval", ParamValue::Float(10.0));
        params.insert("muscle_list", ParamValue::List(vec!["all".into()]));
        params.insert("forces_file", ParamValue::Absent);

        assert!(params.bool("on").unwrap());
        assert_eq!(params.integer("step_interval").unwrap(), 10);
        assert_eq!(params.list("muscle_list").unwrap(), vec!["all"]);
        assert_eq!(params.optional_text("forces_file").unwrap(), None);
        assert_eq!(params.optional_text("not_there").unwrap(), None);
    }

    #[test]
    fn test_numeric_list_keeps_text() {
        let mut params = ParameterMap::new("MuscleAnalysis");
        params.insert_text("muscle_list", " 1.50 ");
        assert_eq!(params.float("muscle_list").unwrap(), 1.5);
        assert_eq!(params.list("muscle_list").unwrap(), vec!["1.50"]);

        params.insert("muscle_list", ParamValue::Float(2.0));
        assert_eq!(params.list("muscle_list").unwrap(), vec!["2"]);
    }

    #[test]
    fn test_accessor_errors_name_node_and_key() {
        let mut params = ParameterMap::new("JointReaction");
        params.insert("in_degrees", ParamValue::Float(1.0));

        let missing = params.bool("on").unwrap_err();
        assert!(matches!(missing, ParamError::Missing { ref node, ref key }
            if node == "JointReaction" && key == "on"));

        let wrong = params.bool("in_degrees").unwrap_err();
        assert!(matches!(wrong, ParamError::WrongType { expected: "布尔值", .. }));
    }
}
