//! OpenSim XML 文档生成 - 基础设施层
//!
//! 只负责把分析对象、分析工具设置、外力设置写成引擎能读的 XML

use crate::error::{AppError, AppResult};
use crate::infrastructure::engine::AnalyzeToolSetup;
use crate::models::{Analysis, AnalysisSettings, ModelHandle};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::Write;
use std::path::Path;

/// OpenSim 文档版本号
const DOCUMENT_VERSION: &str = "30000";

const DATAFILE: &str = "datafile";
const KINEMATICS_FILE: &str = "external_loads_model_kinematics_file";
const LOAD_KINEMATICS_CUTOFF: &str = "lowpass_cutoff_frequency_for_load_kinematics";

fn write_err(e: impl std::fmt::Display) -> AppError {
    AppError::xml("<生成的文档>", e)
}

fn text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> AppResult<()> {
    writer
        .create_element(name)
        .write_text_content(BytesText::new(text))
        .map_err(write_err)?;
    Ok(())
}

fn start<W: Write>(writer: &mut Writer<W>, name: &str, attr_name: Option<&str>) -> AppResult<()> {
    let mut elem = BytesStart::new(name);
    if let Some(attr_name) = attr_name {
        elem.push_attribute(("name", attr_name));
    }
    writer.write_event(Event::Start(elem)).map_err(write_err)?;
    Ok(())
}

fn end<W: Write>(writer: &mut Writer<W>, name: &str) -> AppResult<()> {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(write_err)?;
    Ok(())
}

fn document_start<W: Write>(writer: &mut Writer<W>) -> AppResult<()> {
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(write_err)?;
    let mut root = BytesStart::new("OpenSimDocument");
    root.push_attribute(("Version", DOCUMENT_VERSION));
    writer.write_event(Event::Start(root)).map_err(write_err)?;
    Ok(())
}

fn bool_text(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

fn path_text(path: &Path) -> String {
    path.display().to_string()
}

/// 写出单个分析对象
fn write_analysis<W: Write>(writer: &mut Writer<W>, analysis: &Analysis) -> AppResult<()> {
    let tag = analysis.kind().node_name();
    start(writer, tag, Some(&analysis.name))?;

    let common = &analysis.common;
    text_element(writer, "on", bool_text(common.on))?;
    text_element(writer, "start_time", &common.start_time.to_string())?;
    text_element(writer, "end_time", &common.end_time.to_string())?;
    text_element(writer, "step_interval", &common.step_interval.to_string())?;
    text_element(writer, "in_degrees", bool_text(common.in_degrees))?;

    match &analysis.settings {
        AnalysisSettings::StaticOptimization(so) => {
            text_element(writer, "use_model_force_set", bool_text(so.use_model_force_set))?;
            text_element(writer, "activation_exponent", &so.activation_exponent.to_string())?;
            text_element(writer, "use_muscle_physiology", bool_text(so.use_muscle_physiology))?;
            text_element(
                writer,
                "optimizer_convergence_criterion",
                &so.optimizer_convergence_criterion.to_string(),
            )?;
            text_element(
                writer,
                "optimizer_max_iterations",
                &so.optimizer_max_iterations.to_string(),
            )?;
        }
        AnalysisSettings::MuscleAnalysis(ma) => {
            text_element(writer, "muscle_list", &ma.muscle_list.join(" "))?;
            text_element(
                writer,
                "moment_arm_coordinate_list",
                &ma.moment_arm_coordinate_list.join(" "),
            )?;
        }
        AnalysisSettings::JointReaction(jr) => {
            text_element(writer, "forces_file", jr.forces_file.as_deref().unwrap_or(""))?;
            text_element(writer, "joint_names", &jr.joint_names.join(" "))?;
            text_element(writer, "apply_on_bodies", &jr.apply_on_bodies.join(" "))?;
            text_element(writer, "express_in_frame", &jr.express_in_frame.join(" "))?;
        }
    }

    end(writer, tag)
}

fn finish(writer: Writer<Vec<u8>>) -> AppResult<String> {
    String::from_utf8(writer.into_inner()).map_err(write_err)
}

/// 单个分析对象的 XML 文档（print_to_xml）
pub fn analysis_document(analysis: &Analysis) -> AppResult<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);
    document_start(&mut writer)?;
    write_analysis(&mut writer, analysis)?;
    end(&mut writer, "OpenSimDocument")?;
    finish(writer)
}

/// 分析工具设置文档，包含模型上挂载的全部分析
pub fn analyze_tool_document(model: &ModelHandle, setup: &AnalyzeToolSetup) -> AppResult<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);
    document_start(&mut writer)?;
    start(&mut writer, "AnalyzeTool", Some(&setup.name))?;

    text_element(&mut writer, "model_file", &path_text(model.path()))?;
    text_element(&mut writer, "replace_force_set", "false")?;
    let force_sets: Vec<String> = setup.force_set_files.iter().map(|p| path_text(p)).collect();
    text_element(&mut writer, "force_set_files", &force_sets.join(" "))?;
    text_element(&mut writer, "results_directory", &path_text(&setup.results_dir))?;
    text_element(&mut writer, "initial_time", &setup.initial_time.to_string())?;
    text_element(&mut writer, "final_time", &setup.final_time.to_string())?;
    text_element(
        &mut writer,
        "solve_for_equilibrium_for_auxiliary_states",
        bool_text(setup.solve_for_equilibrium),
    )?;

    start(&mut writer, "AnalysisSet", Some("Analyses"))?;
    start(&mut writer, "objects", None)?;
    for analysis in model.analyses() {
        write_analysis(&mut writer, analysis)?;
    }
    end(&mut writer, "objects")?;
    end(&mut writer, "AnalysisSet")?;

    let external_loads = setup
        .external_loads_file
        .as_deref()
        .map(path_text)
        .unwrap_or_default();
    text_element(&mut writer, "external_loads_file", &external_loads)?;
    text_element(&mut writer, "coordinates_file", &path_text(&setup.coordinates_file))?;
    // -1 表示不滤波
    let cutoff = setup.lowpass_cutoff.unwrap_or(-1.0);
    text_element(&mut writer, "lowpass_cutoff_frequency_for_coordinates", &cutoff.to_string())?;

    end(&mut writer, "AnalyzeTool")?;
    end(&mut writer, "OpenSimDocument")?;
    finish(writer)
}

/// 基于外力模板生成试次专用的外力设置
///
/// 替换 `<ExternalLoads>` 下的数据文件、运动学文件和（可选的）滤波频率，
/// 模板中没有的字段补在末尾，其余内容原样保留
pub fn external_loads_document(
    template: &str,
    source: &str,
    datafile: &Path,
    kinematics_file: &Path,
    lowpass_cutoff: Option<f64>,
) -> AppResult<String> {
    let mut overrides: Vec<(&str, String, bool)> = vec![
        (DATAFILE, path_text(datafile), false),
        (KINEMATICS_FILE, path_text(kinematics_file), false),
    ];
    if let Some(cutoff) = lowpass_cutoff {
        overrides.push((LOAD_KINEMATICS_CUTOFF, cutoff.to_string(), false));
    }

    let mut reader = Reader::from_str(template);
    let mut writer = Writer::new(Vec::new());
    let mut stack: Vec<String> = Vec::new();
    let mut found_loads = false;

    loop {
        let event = reader.read_event().map_err(|e| AppError::xml(source, e))?;
        let in_loads = stack.last().is_some_and(|name| name == "ExternalLoads");

        match event {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match overrides.iter_mut().find(|(key, _, _)| in_loads && *key == name) {
                    Some((_, value, written)) => {
                        let end_tag = e.to_end().into_owned();
                        reader
                            .read_to_end(end_tag.name())
                            .map_err(|err| AppError::xml(source, err))?;
                        writer.write_event(Event::Start(e)).map_err(write_err)?;
                        writer
                            .write_event(Event::Text(BytesText::new(value)))
                            .map_err(write_err)?;
                        writer.write_event(Event::End(end_tag)).map_err(write_err)?;
                        *written = true;
                    }
                    None => {
                        if name == "ExternalLoads" {
                            found_loads = true;
                        }
                        stack.push(name);
                        writer.write_event(Event::Start(e)).map_err(write_err)?;
                    }
                }
            }
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match overrides.iter_mut().find(|(key, _, _)| in_loads && *key == name) {
                    Some((_, value, written)) => {
                        text_element(&mut writer, &name, value)?;
                        *written = true;
                    }
                    None => {
                        writer.write_event(Event::Empty(e)).map_err(write_err)?;
                    }
                }
            }
            Event::End(e) => {
                if stack.pop().as_deref() == Some("ExternalLoads") {
                    for (key, value, written) in overrides.iter_mut().filter(|(_, _, w)| !*w) {
                        text_element(&mut writer, key, value)?;
                        *written = true;
                    }
                }
                writer.write_event(Event::End(e)).map_err(write_err)?;
            }
            Event::Eof => break,
            other => {
                writer.write_event(other).map_err(write_err)?;
            }
        }
    }

    if !found_loads {
        return Err(AppError::xml(source, "模板中没有 <ExternalLoads> 节点"));
    }

    finish(writer)
}
