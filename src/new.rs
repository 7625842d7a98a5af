use std::{env, fs, path::PathBuf};

use anyhow::Result;
use minijinja::{context, Environment};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::info;

use crate::{entity::Collection, helpers::run_command, CONTENT_DIR, FOLIO_FILE};

static TEMPLATE_PROJECT_FILE: &str = r#"[site]
website = "http://localhost"
title = {{ name }}
description = ""
{%- if author %}
author = {{ author }}
{%- endif %}

[[site.menu]]
name = "Posts"
url = "/posts/"

[[site.menu]]
name = "Projects"
url = "/projects/"
"#;

static TEMPLATE_POST_FILE: &str = r#"+++
title = "Hello World"
pub_datetime = {{ pub_datetime }}
description = "The first post."
tags = ["hello"]
+++

Write something here.
"#;

static TEMPLATE_PROJECT_ENTRY_FILE: &str = r#"+++
title = "First Project"
pub_datetime = {{ pub_datetime }}
description = "The first project."
url = "https://github.com"
+++
"#;

struct FolioScaffold {
    source: PathBuf,
    author: String,
    pub_datetime: String,
}

impl FolioScaffold {
    fn create_project(&self, name: &str) -> Result<()> {
        let env = Environment::new();
        if !self.source.exists() {
            fs::create_dir_all(&self.source)?;
        }

        // Generate project folio.toml
        fs::write(
            self.source.join(FOLIO_FILE),
            env.render_str(
                TEMPLATE_PROJECT_FILE,
                context! {
                    name => toml_string(name),
                    author => (!self.author.is_empty()).then(|| toml_string(&self.author)),
                },
            )?,
        )?;

        self.create_entry(
            &env,
            Collection::Posts,
            "hello-world.md",
            TEMPLATE_POST_FILE,
        )?;
        self.create_entry(
            &env,
            Collection::Projects,
            "first-project.md",
            TEMPLATE_PROJECT_ENTRY_FILE,
        )?;
        Ok(())
    }

    fn create_entry(
        &self,
        env: &Environment,
        collection: Collection,
        file_name: &str,
        template: &str,
    ) -> Result<()> {
        let dir = self.source.join(CONTENT_DIR).join(collection.dir_name());
        fs::create_dir_all(&dir)?;
        fs::write(
            dir.join(file_name),
            env.render_str(template, context! { pub_datetime => &self.pub_datetime })?,
        )?;
        Ok(())
    }
}

// A quoted TOML basic string.
fn toml_string(value: &str) -> String {
    toml::Value::String(value.to_owned()).to_string()
}

/// Scaffold a new folio site in the `name` directory, or the current one.
pub fn new_folio_project(name: Option<String>) -> Result<()> {
    let source = if let Some(name) = name.as_ref() {
        env::current_dir()?.join(name)
    } else {
        env::current_dir()?
    };

    let author = run_command("git", &["config", "user.name"])
        .ok()
        .unwrap_or_default();
    let scaffold = FolioScaffold {
        source,
        author,
        pub_datetime: OffsetDateTime::now_utc()
            .replace_nanosecond(0)?
            .format(&Rfc3339)?,
    };

    scaffold.create_project(&name.unwrap_or_default())?;
    info!("Created new folio site in `{}`", scaffold.source.display());
    Ok(())
}
