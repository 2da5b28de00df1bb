use crate::error::{AppError, AppResult};
use crate::models::params::{ParamValue, ParameterMap};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::path::Path;
use tokio::fs;

/// 从模板 XML 中提取某个分析节点的参数
///
/// 等价于 `.//<node>/*`：文档中所有名为 `node` 的元素的直接子元素，
/// 后出现的同名参数覆盖先出现的。找不到节点时返回空表。
pub async fn load_parameters(xml_path: &Path, node: &str) -> AppResult<ParameterMap> {
    let content = fs::read_to_string(xml_path)
        .await
        .map_err(|e| AppError::file_read_failed(xml_path, e))?;

    let params = parse_parameters_str(&content, node, &xml_path.display().to_string())?;

    tracing::debug!(
        "从 {} 的 <{}> 中提取到 {} 个参数",
        xml_path.display(),
        node,
        params.len()
    );

    Ok(params)
}

/// 栈中的一个元素
struct Frame {
    name: String,
    /// 父元素是目标节点时，收集本元素的直接文本
    capture: Option<String>,
    /// 已出现子元素，之后的文本不再计入
    has_child: bool,
}

fn mark_child(stack: &mut [Frame]) {
    if let Some(parent) = stack.last_mut() {
        parent.has_child = true;
    }
}

fn capturing(stack: &mut [Frame]) -> Option<&mut String> {
    stack
        .last_mut()
        .filter(|frame| !frame.has_child)
        .and_then(|frame| frame.capture.as_mut())
}

/// 从 XML 字符串中提取参数
///
/// `source` 仅用于错误信息
pub fn parse_parameters_str(xml: &str, node: &str, source: &str) -> AppResult<ParameterMap> {
    let mut reader = Reader::from_str(xml);
    let mut params = ParameterMap::new(node);
    let mut stack: Vec<Frame> = Vec::new();
    let mut seen_root = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| AppError::xml(source, format!("位置 {}: {}", reader.buffer_position(), e)))?;

        match event {
            Event::Start(ref e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                let capture = parent_is(&stack, node).then(String::new);
                mark_child(&mut stack);
                stack.push(Frame {
                    name,
                    capture,
                    has_child: false,
                });
                seen_root = true;
            }
            Event::Empty(ref e) => {
                if parent_is(&stack, node) {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                    params.insert(name, ParamValue::Absent);
                }
                mark_child(&mut stack);
                seen_root = true;
            }
            Event::Text(ref t) => {
                if let Some(text) = capturing(&mut stack) {
                    let unescaped = t.unescape().map_err(|e| AppError::xml(source, e))?;
                    text.push_str(&unescaped);
                }
            }
            Event::CData(ref c) => {
                if let Some(text) = capturing(&mut stack) {
                    text.push_str(&String::from_utf8_lossy(c));
                }
            }
            Event::End(_) => {
                if let Some(frame) = stack.pop() {
                    if let Some(text) = frame.capture {
                        params.insert_text(frame.name, &text);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(AppError::xml(
            source,
            format!("文档意外结束，<{}> 未闭合", stack[stack.len() - 1].name),
        ));
    }
    if !seen_root {
        return Err(AppError::xml(source, "文档中没有任何元素"));
    }

    Ok(params)
}

fn parent_is(stack: &[Frame], node: &str) -> bool {
    stack.last().is_some_and(|parent| parent.name == node)
}
