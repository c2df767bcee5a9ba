//! Language plugins, one per supported language family

pub mod c;
pub mod csharp;
pub mod javascript;
pub mod python;

use crate::plugin::LanguagePlugin;
use crate::project::Project;
use sprig_core::Language;

/// Every plugin for one run, borrowing the same project.
pub struct Plugins<'a> {
    c: c::CPlugin<'a>,
    csharp: csharp::CSharpPlugin<'a>,
    python: python::PythonPlugin<'a>,
    javascript: javascript::JavaScriptPlugin<'a>,
}

impl<'a> Plugins<'a> {
    pub fn new(project: &'a Project) -> Self {
        Plugins {
            c: c::CPlugin::new(project),
            csharp: csharp::CSharpPlugin::new(project),
            python: python::PythonPlugin::new(project),
            javascript: javascript::JavaScriptPlugin::new(project),
        }
    }

    /// The plugin handling `language`. TypeScript shares the JavaScript plugin.
    pub fn for_language(&self, language: Language) -> &dyn LanguagePlugin {
        match language {
            Language::C => &self.c,
            Language::CSharp => &self.csharp,
            Language::Python => &self.python,
            Language::JavaScript | Language::TypeScript => &self.javascript,
        }
    }
}
