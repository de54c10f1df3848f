//! Document capability consumed by the page detector
//!
//! [`Document`] is the narrow slice of a page the detector needs: enumerate
//! forms, check them for password inputs, register submit listeners and read
//! the page location. [`InMemoryDocument`] is a self-contained model of that
//! slice, with real listener bookkeeping: a form carrying two listeners
//! dispatches a submit twice.

use anyhow::{Result, bail};

use crate::models::hostname_of;

/// Identity of a form element within one page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FormId(pub u64);

/// Where the page currently is
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    pub href: String,
    pub hostname: String,
}

impl PageLocation {
    pub fn parse(href: &str) -> Result<Self> {
        Ok(Self { href: href.to_string(), hostname: hostname_of(href)? })
    }
}

pub trait Document {
    /// All form elements currently in the document
    fn forms(&self) -> Vec<FormId>;

    /// Whether `form` still exists and contains at least one password input
    fn contains_password_input(&self, form: FormId) -> bool;

    /// Register one submit listener on `form`
    fn add_submit_listener(&mut self, form: FormId) -> Result<()>;

    fn location(&self) -> Result<PageLocation>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Text,
    Email,
    Password,
    Hidden,
    Submit,
}

#[derive(Debug, Clone)]
struct Form {
    id: FormId,
    inputs: Vec<InputKind>,
    listeners: usize,
}

#[derive(Debug, Clone)]
pub struct InMemoryDocument {
    href: String,
    forms: Vec<Form>,
    next_id: u64,
}

impl InMemoryDocument {
    pub fn new(href: &str) -> Self {
        Self { href: href.to_string(), forms: Vec::new(), next_id: 1 }
    }

    /// Insert a form with the given inputs and return its identity
    pub fn add_form(&mut self, inputs: &[InputKind]) -> FormId {
        let id = FormId(self.next_id);
        self.next_id += 1;
        self.forms.push(Form { id, inputs: inputs.to_vec(), listeners: 0 });
        id
    }

    pub fn remove_form(&mut self, form: FormId) {
        self.forms.retain(|f| f.id != form);
    }

    /// Replace a form's inputs, keeping its identity and listeners
    pub fn set_inputs(&mut self, form: FormId, inputs: &[InputKind]) {
        if let Some(f) = self.forms.iter_mut().find(|f| f.id == form) {
            f.inputs = inputs.to_vec();
        }
    }

    pub fn set_href(&mut self, href: &str) {
        self.href = href.to_string();
    }

    /// Number of submit listeners registered on `form`
    pub fn listener_count(&self, form: FormId) -> usize {
        self.forms.iter().find(|f| f.id == form).map_or(0, |f| f.listeners)
    }
}

impl Document for InMemoryDocument {
    fn forms(&self) -> Vec<FormId> {
        self.forms.iter().map(|f| f.id).collect()
    }

    fn contains_password_input(&self, form: FormId) -> bool {
        self.forms
            .iter()
            .find(|f| f.id == form)
            .is_some_and(|f| f.inputs.contains(&InputKind::Password))
    }

    fn add_submit_listener(&mut self, form: FormId) -> Result<()> {
        match self.forms.iter_mut().find(|f| f.id == form) {
            Some(f) => {
                f.listeners += 1;
                Ok(())
            }
            None => bail!("Form {:?} is no longer in the document", form),
        }
    }

    fn location(&self) -> Result<PageLocation> {
        PageLocation::parse(&self.href)
    }
}
