//! Built-in transforms

use crate::call::{ArgValue, TransformCall};
use crate::error::{TransformError, TransformResult};
use crate::registry::TransformHandler;
use cq_core::TableDefinition;

/// `group(by=[...])`: set the GROUP BY list of the definition.
///
/// Without `by`, groups by every primary-key attribute.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupTransform;

impl TransformHandler for GroupTransform {
    fn apply(
        &self,
        def: &mut TableDefinition,
        call: &TransformCall,
        _alias: Option<&str>,
    ) -> TransformResult<()> {
        let invalid = |message: String| TransformError::InvalidArgument {
            name: call.name.clone(),
            message,
        };

        if call.args.len() > 1 {
            return Err(invalid(format!(
                "expected at most 1 positional argument, got {}",
                call.args.len()
            )));
        }
        if let Some((key, _)) = call.kwargs.iter().find(|(k, _)| k != "by") {
            return Err(invalid(format!("unexpected keyword '{key}'")));
        }
        if !call.args.is_empty() && call.kwarg("by").is_some() {
            return Err(invalid("'by' given twice".to_string()));
        }

        let by = call.args.first().or_else(|| call.kwarg("by"));
        def.group_by = match by {
            None | Some(ArgValue::None) => def
                .attributes
                .iter()
                .filter(|a| a.is_pk)
                .map(|a| a.name.clone())
                .collect(),
            Some(ArgValue::List(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| invalid(format!("'by' entries must be column names, got {item}")))
                })
                .collect::<TransformResult<Vec<_>>>()?,
            Some(other) => match other.as_str() {
                Some(column) => vec![column.to_string()],
                None => return Err(invalid(format!("'by' must be a list of columns, got {other}"))),
            },
        };
        Ok(())
    }

    fn describe(&self) -> String {
        "GROUP BY the given columns (default: primary-key attributes)".to_string()
    }
}
