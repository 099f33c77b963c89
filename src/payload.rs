use crate::error::SummaryError;
use serde_json::{Map, Value};

/// A borrowed position inside an untyped payload, remembering how it was reached
/// so every failure can name the offending field.
#[derive(Debug, Clone)]
pub struct Node<'a> {
  value: &'a Value,
  path: String,
}

impl<'a> Node<'a> {
  pub fn root(value: &'a Value) -> Self {
    Node {
      value,
      path: String::new(),
    }
  }

  pub fn value(&self) -> &'a Value {
    self.value
  }

  pub fn path(&self) -> &str {
    if self.path.is_empty() {
      "$"
    } else {
      &self.path
    }
  }

  fn child_path(&self, key: &str) -> String {
    if self.path.is_empty() {
      key.to_string()
    } else {
      format!("{}.{key}", self.path)
    }
  }

  pub fn fail(&self, reason: impl Into<String>) -> SummaryError {
    SummaryError::validation(self.path(), reason)
  }

  /// True when the key exists, even if its value is `null`.
  pub fn has_key(&self, key: &str) -> bool {
    self
      .value
      .as_object()
      .map(|map| map.contains_key(key))
      .unwrap_or(false)
  }

  /// Child lookup where an explicit `null` counts as absent.
  pub fn opt(&self, key: &str) -> Option<Node<'a>> {
    let value = self.value.as_object()?.get(key)?;
    if value.is_null() {
      return None;
    }
    Some(Node {
      value,
      path: self.child_path(key),
    })
  }

  /// Child lookup that keeps an explicit `null`.
  pub fn raw(&self, key: &str) -> Option<Node<'a>> {
    let value = self.value.as_object()?.get(key)?;
    Some(Node {
      value,
      path: self.child_path(key),
    })
  }

  pub fn req(&self, key: &str) -> Result<Node<'a>, SummaryError> {
    if !self.value.is_object() {
      return Err(self.fail("expected an object"));
    }
    self
      .opt(key)
      .ok_or_else(|| SummaryError::validation(self.child_path(key), "missing required field"))
  }

  pub fn is_null(&self) -> bool {
    self.value.is_null()
  }

  pub fn object(&self) -> Result<&'a Map<String, Value>, SummaryError> {
    self.value.as_object().ok_or_else(|| self.fail("expected an object"))
  }

  pub fn entries(&self) -> Result<Vec<(&'a str, Node<'a>)>, SummaryError> {
    let map = self.object()?;
    Ok(
      map
        .iter()
        .map(|(key, value)| {
          (
            key.as_str(),
            Node {
              value,
              path: self.child_path(key),
            },
          )
        })
        .collect(),
    )
  }

  pub fn items(&self) -> Result<Vec<Node<'a>>, SummaryError> {
    let items = self.value.as_array().ok_or_else(|| self.fail("expected an array"))?;
    Ok(
      items
        .iter()
        .enumerate()
        .map(|(idx, value)| Node {
          value,
          path: format!("{}[{idx}]", self.path()),
        })
        .collect(),
    )
  }

  /// Array that must hold exactly one entry per side.
  pub fn pair(&self) -> Result<[Node<'a>; 2], SummaryError> {
    let items = self.items()?;
    match <[Node<'a>; 2]>::try_from(items) {
      Ok(pair) => Ok(pair),
      Err(items) => Err(self.fail(format!("expected exactly 2 entries, found {}", items.len()))),
    }
  }

  pub fn str(&self) -> Result<&'a str, SummaryError> {
    self.value.as_str().ok_or_else(|| self.fail("expected a string"))
  }

  pub fn bool(&self) -> Result<bool, SummaryError> {
    self.value.as_bool().ok_or_else(|| self.fail("expected a boolean"))
  }

  pub fn u32(&self) -> Result<u32, SummaryError> {
    value_to_u32(self.value).ok_or_else(|| self.fail("expected a non-negative integer"))
  }

  pub fn f64(&self) -> Result<f64, SummaryError> {
    self.value.as_f64().ok_or_else(|| self.fail("expected a number"))
  }

  pub fn req_u32(&self, key: &str) -> Result<u32, SummaryError> {
    self.req(key)?.u32()
  }

  pub fn req_str(&self, key: &str) -> Result<&'a str, SummaryError> {
    self.req(key)?.str()
  }

  pub fn req_bool(&self, key: &str) -> Result<bool, SummaryError> {
    self.req(key)?.bool()
  }
}

/// Integer counters only; floats with a fractional part and numeric strings are rejected.
pub fn value_to_u32(value: &Value) -> Option<u32> {
  match value {
    Value::Number(num) => num.as_u64().and_then(|num| u32::try_from(num).ok()),
    _ => None,
  }
}

/// Side number as it appears on the wire: `1`/`2` or `"1"`/`"2"`.
pub fn value_to_side_number(value: &Value) -> Option<u8> {
  let num = match value {
    Value::Number(num) => num.as_u64()?,
    Value::String(raw) => raw.trim().parse::<u64>().ok()?,
    _ => return None,
  };
  match num {
    1 => Some(1),
    2 => Some(2),
    _ => None,
  }
}
