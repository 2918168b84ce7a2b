use std::collections::HashMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use tracing::{
  debug,
  info,
  trace,
  warn
};

pub const DEFAULT_STORAGE_KEY: &str =
  "tasks";

#[derive(Debug, Clone)]
pub struct Config {
  map: HashMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    let mut map = HashMap::new();
    map.insert(
      "data.location".to_string(),
      "~/.jot".to_string()
    );
    map.insert(
      "storage.key".to_string(),
      DEFAULT_STORAGE_KEY.to_string()
    );
    map.insert(
      "color".to_string(),
      "on".to_string()
    );
    Self {
      map,
      loaded_files: vec![]
    }
  }
}

impl Config {
  #[tracing::instrument(skip(
    jotrc_override
  ))]
  pub fn load(
    jotrc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Config::default();

    let jotrc = resolve_jotrc_path(
      jotrc_override
    )?;
    if let Some(path) = jotrc {
      info!(jotrc = %path.display(), "loading jotrc");
      cfg.load_file(&path)?;
    } else {
      debug!(
        "no jotrc found; using \
         defaults"
      );
    }

    Ok(cfg)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, value = %v, "applying override");
      self.map.insert(key, v);
    }
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<String> {
    self.map.get(key).cloned()
  }

  pub fn iter(
    &self
  ) -> impl Iterator<Item = (&String, &String)>
  {
    self.map.iter()
  }

  /// Name of the slot the task list
  /// lives in.
  pub fn storage_key(
    &self
  ) -> anyhow::Result<String> {
    let key = self
      .get("storage.key")
      .unwrap_or_else(|| {
        DEFAULT_STORAGE_KEY.to_string()
      });
    let valid = !key.is_empty()
      && key.chars().all(|c| {
        c.is_ascii_alphanumeric()
          || c == '-'
          || c == '_'
      });
    if !valid {
      return Err(anyhow!(
        "invalid storage.key: {key:?} \
         (use letters, digits, - or _)"
      ));
    }
    Ok(key)
  }

  pub fn color(
    &self
  ) -> anyhow::Result<bool> {
    let raw = self
      .get("color")
      .unwrap_or_else(|| {
        "on".to_string()
      });
    parse_bool(&raw).ok_or_else(|| {
      anyhow!(
        "invalid color setting: {raw}"
      )
    })
  }

  #[tracing::instrument(skip(self))]
  fn load_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;

    self
      .loaded_files
      .push(path.clone());

    let base_dir = path
      .parent()
      .map(|p| p.to_path_buf())
      .unwrap_or_else(|| {
        PathBuf::from(".")
      });

    for (line_num, raw_line) in
      text.lines().enumerate()
    {
      let mut line = raw_line.trim();
      if let Some((before, _)) =
        line.split_once('#')
      {
        line = before.trim();
      }

      if line.is_empty() {
        continue;
      }

      if let Some(include_rest) =
        line.strip_prefix("include ")
      {
        let include_path =
          resolve_include_path(
            &base_dir,
            include_rest.trim()
          )?;
        debug!(
            file = %path.display(),
            include = %include_path.display(),
            line = line_num + 1,
            "processing include"
        );

        if include_path.exists() {
          self
            .load_file(&include_path)?;
        } else {
          warn!(include = %include_path.display(), "include file does not exist; skipping");
        }
        continue;
      }

      let (k, v) = line
        .split_once('=')
        .ok_or_else(|| {
          anyhow!(
            "invalid config line \
             {}:{}: {}",
            path.display(),
            line_num + 1,
            raw_line
          )
        })?;

      let key = k.trim().to_string();
      let value = v.trim().to_string();
      trace!(key = %key, value = %value, "loaded config key");
      self.map.insert(key, value);
    }

    Ok(())
  }
}

#[tracing::instrument(skip(
  cfg,
  override_dir
))]
pub fn resolve_data_dir(
  cfg: &Config,
  override_dir: Option<&Path>
) -> anyhow::Result<PathBuf> {
  let dir = if let Some(path) =
    override_dir
  {
    path.to_path_buf()
  } else if let Some(cfg_value) =
    cfg.get("data.location")
  {
    expand_tilde(Path::new(&cfg_value))
  } else {
    default_data_dir()?
  };

  if !dir.exists() {
    info!(dir = %dir.display(), "creating data directory");
    fs::create_dir_all(&dir)
      .with_context(|| {
        format!(
          "failed to create {}",
          dir.display()
        )
      })?;
  }

  Ok(dir)
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_jotrc_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(jotrc_env) =
    std::env::var("JOTRC")
  {
    if jotrc_env == "/dev/null" {
      return Ok(None);
    }
    return Ok(Some(PathBuf::from(
      jotrc_env
    )));
  }

  let Some(home) = dirs::home_dir()
  else {
    warn!(
      "cannot determine home \
       directory; skipping ~/.jotrc"
    );
    return Ok(None);
  };
  let candidate = home.join(".jotrc");
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

fn default_data_dir()
-> anyhow::Result<PathBuf> {
  let home = dirs::home_dir()
    .ok_or_else(|| {
      anyhow!(
        "cannot determine home \
         directory"
      )
    })?;
  Ok(home.join(".jot"))
}

fn resolve_include_path(
  base_dir: &Path,
  include: &str
) -> anyhow::Result<PathBuf> {
  if include.trim().is_empty() {
    return Err(anyhow!(
      "include path cannot be empty"
    ));
  }

  let raw = PathBuf::from(include);
  let expanded = expand_tilde(&raw);
  if expanded.is_absolute() {
    Ok(expanded)
  } else {
    Ok(base_dir.join(expanded))
  }
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_bool(s: &str) -> Option<bool> {
  match s
    .trim()
    .to_ascii_lowercase()
    .as_str()
  {
    | "1" | "y" | "yes" | "on"
    | "true" => Some(true),
    | "0" | "n" | "no" | "off"
    | "false" => Some(false),
    | _ => None
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_without_file() {
    let cfg = Config::default();
    assert_eq!(
      cfg.storage_key().expect("key"),
      "tasks"
    );
    assert!(cfg.color().expect("color"));
    assert_eq!(
      cfg.get("data.location")
        .as_deref(),
      Some("~/.jot")
    );
  }

  #[test]
  fn loads_file_with_include_and_comments()
  {
    let temp = tempfile::tempdir()
      .expect("tempdir");
    let extra = temp.path().join("extra.rc");
    fs::write(
      &extra,
      "color = off\n"
    )
    .expect("write include");
    let main = temp.path().join("jotrc");
    fs::write(
      &main,
      "# personal settings\n\
       storage.key = groceries  # slot\n\
       \n\
       include extra.rc\n\
       include missing.rc\n"
    )
    .expect("write rc");

    let cfg = Config::load(Some(main.as_path()))
      .expect("load");
    assert_eq!(
      cfg.storage_key().expect("key"),
      "groceries"
    );
    assert!(!cfg.color().expect("color"));
    assert_eq!(cfg.loaded_files.len(), 2);
  }

  #[test]
  fn rejects_line_without_equals() {
    let temp = tempfile::tempdir()
      .expect("tempdir");
    let main = temp.path().join("jotrc");
    fs::write(&main, "color off\n")
      .expect("write rc");
    assert!(
      Config::load(Some(main.as_path())).is_err()
    );
  }

  #[test]
  fn overrides_strip_rc_prefix() {
    let mut cfg = Config::default();
    cfg.apply_overrides(vec![
      (
        "rc.storage.key".to_string(),
        "work".to_string()
      ),
      (
        "color".to_string(),
        "maybe".to_string()
      ),
    ]);
    assert_eq!(
      cfg.storage_key().expect("key"),
      "work"
    );
    assert!(cfg.color().is_err());
  }

  #[test]
  fn storage_key_must_be_file_safe() {
    let mut cfg = Config::default();
    cfg.apply_overrides(vec![(
      "storage.key".to_string(),
      "../escape".to_string()
    )]);
    assert!(cfg.storage_key().is_err());
  }

  #[test]
  fn data_dir_override_is_created() {
    let temp = tempfile::tempdir()
      .expect("tempdir");
    let dir = temp.path().join("nested");
    let resolved = resolve_data_dir(
      &Config::default(),
      Some(dir.as_path())
    )
    .expect("resolve");
    assert_eq!(resolved, dir);
    assert!(dir.is_dir());
  }
}
