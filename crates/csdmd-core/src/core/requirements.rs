use phf::phf_ordered_map;
use std::fmt;

/// Declared dependency name mapped to the module that must import for it.
static REQUIRED_PACKAGES: phf::OrderedMap<&'static str, &'static str> = phf_ordered_map! {
    "openmm" => "openmm",
    "openmmplumed" => "openmmplumed",
    "ambertools" => "pytraj",
    "openmmforcefields" => "openmmforcefields",
    "pyyaml" => "yaml",
    "tensorflow" => "tensorflow",
    "pdbfixer" => "pdbfixer",
    "openbabel" => "openbabel",
    "pytest" => "pytest",
};

/// A third-party package the workflow needs, and the module that proves it is installed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageRequirement {
    pub package: String,
    pub module: String,
}

impl PackageRequirement {
    pub fn new(package: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            module: module.into(),
        }
    }

    /// The packages a complete CSD-MD environment provides, in declaration order.
    pub fn builtin() -> Vec<PackageRequirement> {
        REQUIRED_PACKAGES
            .entries()
            .map(|(package, module)| Self::new(*package, *module))
            .collect()
    }

    /// Looks up the import name of a built-in package.
    pub fn builtin_module(package: &str) -> Option<&'static str> {
        REQUIRED_PACKAGES.get(package).copied()
    }
}

impl fmt::Display for PackageRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.package == self.module {
            write!(f, "{}", self.package)
        } else {
            write!(f, "{} (module '{}')", self.package, self.module)
        }
    }
}
