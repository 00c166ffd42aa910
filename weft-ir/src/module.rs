use crate::ir::RegionRef;

#[derive(Debug)]
pub struct Function<'a> {
    pub name: String,
    pub body: RegionRef<'a>,
}

impl<'a> Function<'a> {
    pub fn new(name: impl Into<String>, body: RegionRef<'a>) -> Self {
        Self {
            name: name.into(),
            body,
        }
    }
}

#[derive(Debug, Default)]
pub struct Module<'a> {
    pub functions: Vec<Function<'a>>,
}

impl<'a> Module<'a> {
    pub fn new() -> Self {
        Self {
            functions: Vec::new(),
        }
    }

    pub fn add_function(&mut self, func: Function<'a>) {
        self.functions.push(func);
    }

    pub fn get_function(&self, name: &str) -> Option<&Function<'a>> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn get_function_mut(&mut self, name: &str) -> Option<&mut Function<'a>> {
        self.functions.iter_mut().find(|f| f.name == name)
    }
}
