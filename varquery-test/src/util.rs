use std::fs;
use std::path::Path;

use serde_json::{Value, json};
use tempfile::TempDir;

/// A shell script standing in for tabix. The script lives in a temporary directory that is
/// removed when this value is dropped.
#[derive(Debug)]
pub struct FakeTabix {
  _dir: TempDir,
  executable: String,
}

impl FakeTabix {
  /// A tabix that prints `stdout` and exits successfully.
  pub fn new(stdout: impl AsRef<str>) -> Self {
    Self::with_output(stdout, "", 0)
  }

  /// A tabix that prints `stdout` and `stderr` and exits with `code`.
  pub fn with_output(stdout: impl AsRef<str>, stderr: impl AsRef<str>, code: i32) -> Self {
    Self::from_script(|dir| {
      fs::write(dir.join("stdout.txt"), stdout.as_ref()).unwrap();
      fs::write(dir.join("stderr.txt"), stderr.as_ref()).unwrap();

      format!(
        "cat '{0}/stdout.txt'\ncat '{0}/stderr.txt' >&2\nexit {code}\n",
        dir.display()
      )
    })
  }

  /// A tabix that prints `stderr` and exits with `code`.
  pub fn failing(stderr: impl AsRef<str>, code: i32) -> Self {
    Self::with_output("", stderr, code)
  }

  /// A tabix that prints its arguments.
  pub fn echoing_args() -> Self {
    Self::from_script(|_| "echo \"$@\"\n".to_string())
  }

  /// A tabix that never finishes within `seconds`.
  pub fn sleeping(seconds: u64) -> Self {
    Self::from_script(|_| format!("exec sleep {seconds}\n"))
  }

  /// A tabix that prints the output paired with the data file it is asked to query, and fails
  /// for any other file.
  pub fn by_data_file<I, K, V>(outputs: I) -> Self
  where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
  {
    Self::from_script(|dir| {
      let cases: String = outputs
        .into_iter()
        .enumerate()
        .map(|(index, (data_file, output))| {
          let output_file = dir.join(format!("{index}.txt"));
          fs::write(&output_file, output.as_ref()).unwrap();

          format!(
            "    '{}') cat '{}'; exit 0;;\n",
            data_file.as_ref(),
            output_file.display()
          )
        })
        .collect();

      format!(
        "for arg in \"$@\"; do\n  case \"$arg\" in\n{cases}  esac\ndone\necho \"unknown data file: $@\" >&2\nexit 1\n"
      )
    })
  }

  /// The command line that runs this tabix.
  pub fn executable(&self) -> &str {
    &self.executable
  }

  fn from_script<F>(script: F) -> Self
  where
    F: FnOnce(&Path) -> String,
  {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tabix");
    fs::write(&path, script(dir.path())).unwrap();

    // Run through `sh`, the script is never made executable.
    Self {
      executable: format!("sh {}", path.display()),
      _dir: dir,
    }
  }
}

/// Write a JSON feature matrix with one value array per feature, in `sample_ids` order.
pub fn write_feature_matrix(path: &Path, sample_ids: &[&str], features: &[(&str, Vec<Value>)]) {
  let matrix = json!({
    "sample_id_array": sample_ids,
    "feature_value_array": features.iter().map(|(_, values)| values).collect::<Vec<_>>(),
    "ordered_list": features.iter().map(|(id, _)| [id, id]).collect::<Vec<_>>(),
  });

  fs::write(path, matrix.to_string()).unwrap();
}

/// Write gene region entries as a JSON array.
pub fn write_region_data(path: &Path, regions: &[Value]) {
  fs::write(path, Value::from(regions.to_vec()).to_string()).unwrap();
}
