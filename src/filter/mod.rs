// Filter expressions — which feed items a target amplifies.
//
// A target carries a FilterList: `/`-separated expressions combined with OR.
// Each expression is a tree of atoms (`photo`, `video`, `rt`, `qt`, `all`)
// under `not(..)`, `and(..)` and `or(..)`. Trees are built once at startup
// and only read afterwards.
//
//     and(rt,not(photo))/qt   reposts without photos, or any quote

mod ast;
mod eval;
mod parser;

pub use ast::{AtomKind, FilterList, PredicateNode};
pub use eval::evaluate;
pub use parser::{parse, parse_expr, ParseError};
