use super::signature::{first_match, Candidate, Signature};
use super::{plan_params, ParamPlan, ReturnPlan};
use crate::descriptor::{is_operator, MethodDescriptor, NativeType, TypeScope};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::generate::Settings;
use crate::ownership::{AdoptionSource, Construction, OwnershipResolver};
use crate::runtime::Value;

/// Forwarding stub for one native method (or free function)
#[derive(Debug)]
pub struct MethodStub<'m> {
    pub descriptor: &'m MethodDescriptor,

    /// Name the callable is declared under in the declarations module
    pub native_name: String,

    /// Name of the typed helper doing the actual call
    pub helper: String,

    pub params: Vec<ParamPlan>,
    pub signature: Signature,
    pub returns: ReturnPlan,
}

impl<'m> Candidate for MethodStub<'m> {
    fn signature(&self) -> &Signature {
        &self.signature
    }
}

/// Every stub exposed under one managed name, in declaration order
#[derive(Debug)]
pub struct OverloadSet<'m> {
    /// Exposed name
    pub name: String,

    /// Is this a Python special method standing in for a C++ operator?
    pub operator: bool,

    pub stubs: Vec<MethodStub<'m>>,
}

impl<'m> OverloadSet<'m> {
    /// Stub selected by the arguments (first structural match)
    pub fn resolve<P>(&self, args: &[Value<P>]) -> Option<&MethodStub<'m>> {
        first_match(&self.stubs, args)
    }

    /// Special methods other than `__call__` take exactly one argument besides `self`
    pub fn is_binary_operator(&self) -> bool {
        self.operator && self.name != "__call__"
    }
}

/// Turns method descriptors into overload sets
pub struct Forwarder<'a> {
    /// Class the methods belong to (`None` for free functions)
    pub owner: Option<&'a str>,

    pub scope: &'a dyn TypeScope,
    pub settings: &'a Settings,
    pub resolver: &'a OwnershipResolver,
}

impl<'a> Forwarder<'a> {
    /// Forward methods, grouping them by overload key
    ///
    /// Sets come out in the order their first member was declared. A method whose types cannot
    /// be mapped is skipped (with a diagnostic) without affecting its siblings.
    pub fn forward<'m>(
        &self,
        methods: impl IntoIterator<Item = &'m MethodDescriptor>,
        diagnostics: &mut Diagnostics,
    ) -> Vec<OverloadSet<'m>> {
        let mut sets: Vec<OverloadSet<'m>> = vec![];

        for method in methods {
            let (name, native_name, operator) = match self.exposed_name(method, diagnostics) {
                Some(names) => names,
                None => continue,
            };

            let params = match plan_params(&method.params, self.scope, self.settings) {
                Ok(params) => params,
                Err(bad) => {
                    self.skip(method, format!("cannot map parameter: {}", bad), diagnostics);
                    continue;
                }
            };
            let signature = Signature(params.iter().map(|param| param.shape.clone()).collect());
            if operator && name != "__call__" && signature.arity() != 1 {
                self.skip(
                    method,
                    format!("{} must take exactly one argument", name),
                    diagnostics,
                );
                continue;
            }

            let returns = match self.plan_return(method, diagnostics) {
                Ok(returns) => returns,
                Err(msg) => {
                    self.skip(method, msg, diagnostics);
                    continue;
                }
            };

            let set_idx = match sets.iter().position(|set| set.name == name) {
                Some(idx) => idx,
                None => {
                    sets.push(OverloadSet {
                        name: name.clone(),
                        operator,
                        stubs: vec![],
                    });
                    sets.len() - 1
                }
            };
            let set = &mut sets[set_idx];

            if let Some(earlier) = set
                .stubs
                .iter()
                .find(|stub| stub.signature.covers(&signature))
            {
                diagnostics.push(
                    DiagnosticKind::ShadowedOverload,
                    self.owner,
                    Some(method.name.as_str()),
                    format!(
                        "overload {} of '{}' is never selected, '{}' {} comes first",
                        signature, name, earlier.descriptor.name, earlier.signature
                    ),
                );
            }

            let helper = format!("_{}_{}", name.trim_matches('_'), set.stubs.len());
            set.stubs.push(MethodStub {
                descriptor: method,
                native_name,
                helper,
                params,
                signature,
                returns,
            });
        }

        sets
    }

    /// Exposed name, declared name, and whether this is an operator
    fn exposed_name(
        &self,
        method: &MethodDescriptor,
        diagnostics: &mut Diagnostics,
    ) -> Option<(String, String, bool)> {
        if !is_operator(&method.name) {
            let exposed = self.settings.renamer.rename_method(method.overload_key());
            return Some((exposed, method.name.clone(), false));
        }

        match (self.owner, self.settings.operators.get(&method.name)) {
            (Some(_), Some(special)) => {
                let alias = format!("op_{}", special.trim_matches('_'));
                Some((special.clone(), alias, true))
            }
            (None, _) => {
                self.skip(method, "free operators are not exposed", diagnostics);
                None
            }
            (Some(_), None) => {
                self.skip(method, "operator has no Python counterpart", diagnostics);
                None
            }
        }
    }

    fn plan_return(
        &self,
        method: &MethodDescriptor,
        diagnostics: &mut Diagnostics,
    ) -> Result<ReturnPlan, String> {
        let native = NativeType::parse(&method.return_type, self.scope)
            .map_err(|bad| format!("cannot map return type: {}", bad))?;
        let plan = match native {
            NativeType::Void => ReturnPlan::Void,
            NativeType::Class {
                name,
                indirection,
                is_const,
            } => {
                let source = match self.owner {
                    Some(_) => AdoptionSource::MethodReturn,
                    None => AdoptionSource::FunctionReturn,
                };
                let returned = Construction::Adoption {
                    source,
                    class: self.owner,
                    member: &method.name,
                    indirection,
                    annotation: method.ownership,
                };
                ReturnPlan::Wrap {
                    class: name,
                    is_const,
                    resolution: self.resolver.resolve(&returned, diagnostics),
                }
            }
            builtin => ReturnPlan::Value(builtin),
        };
        Ok(plan)
    }

    fn skip(&self, method: &MethodDescriptor, why: impl Into<String>, diagnostics: &mut Diagnostics) {
        diagnostics.push(
            DiagnosticKind::SkippedMember,
            self.owner,
            Some(method.name.as_str()),
            why,
        );
    }
}
