//! CI annotation commands.

use crate::types::AnnotationFormat;
use utptrace_runtime::AnnotationLevel;

/// Annotation command line for `format`, or `None` for plain output
pub fn format_annotation(
    format: AnnotationFormat,
    level: AnnotationLevel,
    message: &str,
    file: Option<&str>,
    line: Option<i64>,
) -> Option<String> {
    match format {
        AnnotationFormat::Github => Some(github(level, message, file, line)),
        AnnotationFormat::Azure => Some(azure(level, message, file, line)),
        AnnotationFormat::Plain => None,
    }
}

fn github(level: AnnotationLevel, message: &str, file: Option<&str>, line: Option<i64>) -> String {
    let mut properties = Vec::new();
    if let Some(file) = file {
        properties.push(format!("file={}", github_property(file)));
    }
    if let Some(line) = line {
        properties.push(format!("line={}", line));
    }

    let properties = if properties.is_empty() {
        String::new()
    } else {
        format!(" {}", properties.join(","))
    };
    format!("::{}{}::{}", level.as_str(), properties, github_data(message))
}

fn azure(level: AnnotationLevel, message: &str, file: Option<&str>, line: Option<i64>) -> String {
    // Azure only knows errors and warnings
    let kind = match level {
        AnnotationLevel::Error => "error",
        AnnotationLevel::Warning | AnnotationLevel::Notice => "warning",
    };

    let mut properties = format!("type={};", kind);
    if let Some(file) = file {
        properties.push_str(&format!("sourcepath={};", azure_escape(file)));
    }
    if let Some(line) = line {
        properties.push_str(&format!("linenumber={};", line));
    }
    format!("##vso[task.logissue {}]{}", properties, azure_escape(message))
}

fn github_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn github_property(value: &str) -> String {
    github_data(value).replace(':', "%3A").replace(',', "%2C")
}

fn azure_escape(value: &str) -> String {
    value
        .replace('%', "%AZP25")
        .replace(';', "%3B")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
        .replace(']', "%5D")
}
