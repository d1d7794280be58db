//! Genesis invocation: the assembled node command line

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::PathBuf;

use itertools::Itertools;

use crate::domain::entities::{ChainParams, EntityDir};

pub const ENTITY_FLAG: &str = "--entity";
pub const NODE_FLAG: &str = "--node";

/// Program plus ordered argument list for one genesis run.
///
/// Built once from the chain parameters and the discovered entities;
/// there is no way to change it afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenesisCommand {
    program: String,
    args: Vec<OsString>,
}

impl GenesisCommand {
    /// Fixed chain prefix followed by one `--entity`/`--node` pair per entity,
    /// in the order given.
    pub fn new(program: impl Into<String>, params: &ChainParams, entities: &[EntityDir]) -> Self {
        let mut args = params.prefix_args();
        for entity in entities {
            args.push(ENTITY_FLAG.into());
            args.push(entity.entity_genesis().into_os_string());
            args.push(NODE_FLAG.into());
            args.push(entity.node_genesis().into_os_string());
        }
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// `(entity_genesis, node_genesis)` pairs in argument order.
    pub fn entity_pairs(&self) -> Vec<(PathBuf, PathBuf)> {
        self.args
            .iter()
            .tuple_windows()
            .filter(|(flag, _, node_flag, _)| {
                flag.as_os_str() == OsStr::new(ENTITY_FLAG)
                    && node_flag.as_os_str() == OsStr::new(NODE_FLAG)
            })
            .map(|(_, entity, _, node)| (PathBuf::from(entity), PathBuf::from(node)))
            .collect()
    }
}

/// Shell-style rendering, single-quoting arguments that need it.
impl fmt::Display for GenesisCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = std::iter::once(quote(OsStr::new(&self.program)))
            .chain(self.args.iter().map(|a| quote(a)))
            .join(" ");
        f.write_str(&rendered)
    }
}

fn quote(arg: &OsStr) -> String {
    let s = arg.to_string_lossy();
    let plain = !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=,+@%".contains(c));
    if plain {
        s.into_owned()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}
