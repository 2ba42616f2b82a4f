use super::{Error, Settings};
use crate::bind::{bind_class_in, bind_functions, place_functions, ClassBinding, OverloadSet};
use crate::descriptor::{DescriptorSet, TypeScope};
use crate::diagnostics::Diagnostics;
use crate::emit::ModuleWriter;
use std::collections::{BTreeMap, BTreeSet};

/// Type scope of a descriptor set, minus classes that failed to bind
struct Surviving<'s, 'd> {
    set: &'s DescriptorSet<'d>,
    failed: &'s BTreeSet<String>,
}

impl<'s, 'd> TypeScope for Surviving<'s, 'd> {
    fn resolve_typedef(&self, alias: &str) -> Option<&str> {
        self.set.resolve_typedef(alias)
    }

    fn is_class(&self, name: &str) -> bool {
        self.set.is_class(name) && !self.failed.contains(name)
    }
}

/// Classes and functions of a descriptor set, bound as far as possible
pub struct Bound<'s> {
    /// Classes that bound successfully, in declaration order
    pub classes: Vec<ClassBinding<'s>>,

    pub functions: Vec<OverloadSet<'s>>,

    /// One error per class that could not be bound
    pub failures: Vec<Error>,

    pub diagnostics: Diagnostics,
}

/// Bind every class of a set, isolating failures to the class concerned
///
/// When a class fails, the others are bound again without it, so nothing that survives refers
/// to a wrapper that will not exist. Diagnostics come from the final round only.
pub fn bind_all<'s>(set: &'s DescriptorSet<'_>, settings: &Settings) -> Bound<'s> {
    let classes = set.classes();
    let mut dropped: BTreeSet<usize> = BTreeSet::new();
    let mut failures: Vec<Error> = vec![];

    loop {
        // A name stays in scope as long as one class under it survives
        let surviving: BTreeSet<&str> = classes
            .iter()
            .enumerate()
            .filter(|(idx, _)| !dropped.contains(idx))
            .map(|(_, class)| class.name.as_str())
            .collect();
        let failed: BTreeSet<String> = dropped
            .iter()
            .map(|idx| classes[*idx].name.clone())
            .filter(|name| !surviving.contains(name.as_str()))
            .collect();
        let scope = Surviving {
            set,
            failed: &failed,
        };

        let mut diagnostics = Diagnostics::new();
        let mut bound = vec![];
        let mut newly_dropped = vec![];
        for (idx, class) in classes.iter().copied().enumerate() {
            if dropped.contains(&idx) {
                continue;
            }
            match bind_class_in(set, &scope, class, settings, &mut diagnostics) {
                Ok(binding) => bound.push(binding),
                Err(err) => {
                    newly_dropped.push(idx);
                    failures.push(err);
                }
            }
        }

        if newly_dropped.is_empty() {
            let functions = bind_functions(set.functions(), &scope, settings, &mut diagnostics);
            let functions = place_functions(functions, &bound, settings, &mut diagnostics);
            return Bound {
                classes: bound,
                functions,
                failures,
                diagnostics,
            };
        }
        log::debug!("Binding again without {} failed classes", newly_dropped.len());
        dropped.extend(newly_dropped);
    }
}

/// Outcome of generating one extension module
pub struct Generated {
    /// File contents, keyed by file name
    pub files: BTreeMap<String, String>,

    /// Native names of the classes that got a wrapper
    pub wrapped: Vec<String>,

    /// One error per class left out of the module
    pub failures: Vec<Error>,

    pub diagnostics: Diagnostics,
}

impl Generated {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Generate the extension module for a descriptor set
///
/// Errors confined to a class only drop that class; the returned error is for problems that
/// affect the whole module (unusable settings, failure to render).
pub fn generate(set: &DescriptorSet<'_>, settings: &Settings) -> Result<Generated, Error> {
    settings.validate()?;
    log::info!(
        "Generating module '{}' for {} classes",
        settings.module_name,
        set.class_count()
    );

    let bound = bind_all(set, settings);
    for err in &bound.failures {
        log::error!("{}", err);
    }

    let files = ModuleWriter {
        classes: &bound.classes,
        functions: &bound.functions,
        settings,
    }
    .render()?;

    Ok(Generated {
        files,
        wrapped: bound
            .classes
            .iter()
            .map(|binding| binding.name().to_owned())
            .collect(),
        failures: bound.failures,
        diagnostics: bound.diagnostics,
    })
}
