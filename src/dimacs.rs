use std::fs;
use std::path::Path;

use nom::IResult;
use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::{digit1, space0, space1};
use nom::combinator::map_res;
use tracing::warn;

use crate::color::{Solution, VertexId};
use crate::error::LoadError;


/// reads an instance from file, returns (n, edges) with 0-based vertices
pub fn read_from_file<P:AsRef<Path>>(filename:P) -> Result<(usize, Vec<(VertexId,VertexId)>), LoadError> {
    let path = filename.as_ref();
    let content = fs::read_to_string(path)
        .map_err(|source| LoadError::Io { path: path.to_path_buf(), source })?;
    read_from_str(&content)
}

/** parses the content of a DIMACS file, returns (n, edges) with 0-based vertices.
 - `c` lines are comments
 - `p edge n m` (or `p col n m`) declares the number of vertices and edges
 - `e u v` declares an edge (WARNING: indices start at 1 in the DIMACS format)
*/
pub fn read_from_str(content:&str) -> Result<(usize, Vec<(VertexId,VertexId)>), LoadError> {
    let mut header:Option<(usize,usize)> = None;
    let mut edges = Vec::new();
    for (i,raw_line) in content.lines().enumerate() {
        let line = raw_line.trim();
        let line_number = i+1;
        if line.is_empty() || line.starts_with('c') { continue; }
        if line.starts_with('p') {
            let (n,m) = complete_line(read_header(line), line_number)?;
            header = Some((n,m));
        } else if line.starts_with('e') {
            let n = match header {
                None => return Err(LoadError::MissingHeader),
                Some((n,_)) => n,
            };
            let (a,b) = complete_line(read_edge(line), line_number)?;
            if a == 0 || b == 0 {
                return Err(LoadError::Parse {
                    line: line_number, msg: "vertex indices start at 1".to_string()
                });
            }
            let (u,v) = (a-1, b-1);
            if u >= n || v >= n { return Err(LoadError::VertexOutOfRange { u, v, n }); }
            if u == v { return Err(LoadError::SelfLoop(u)); }
            edges.push((u,v));
        } else {
            return Err(LoadError::Parse {
                line: line_number, msg: format!("unrecognized line '{}'", line)
            });
        }
    }
    let (n,m) = header.ok_or(LoadError::MissingHeader)?;
    // some files count every edge twice
    if edges.len() != m && 2*edges.len() != m {
        warn!(declared = m, read = edges.len(), "edge count differs from the problem line");
    }
    Ok((n, edges))
}

/// checks that a line parser consumed the whole line
fn complete_line<T>(res:IResult<&str, T>, line:usize) -> Result<T, LoadError> {
    match res {
        Ok(("", value)) => Ok(value),
        Ok((remaining, _)) => Err(LoadError::Parse {
            line, msg: format!("unexpected trailing content '{}'", remaining)
        }),
        Err(e) => Err(LoadError::Parse { line, msg: e.to_string() }),
    }
}

/// reads a nonnegative integer
fn integer(s:&str) -> IResult<&str, usize> {
    map_res(digit1, |d:&str| d.parse::<usize>())(s)
}

/// reads two integers separated by spaces
fn read_two_integers(s:&str) -> IResult<&str, (usize,usize)> {
    let (s,n1) = integer(s)?;
    let (s,_) = space1(s)?;
    let (s,n2) = integer(s)?;
    let (s,_) = space0(s)?;
    Ok((s,(n1,n2)))
}

/// reads header containing (n,m)
pub fn read_header(s:&str) -> IResult<&str, (usize,usize)> {
    let (s,_) = tag("p")(s)?;
    let (s,_) = space1(s)?;
    let (s,_) = alt((tag("edges"), tag("edge"), tag("col")))(s)?;
    let (s,_) = space1(s)?;
    read_two_integers(s)
}

/// reads edge line (WARNING: indices start at 1 in the DIMACS format)
pub fn read_edge(s:&str) -> IResult<&str, (usize,usize)> {
    let (s,_) = tag("e")(s)?;
    let (s,_) = space1(s)?;
    read_two_integers(s)
}

/** writes a string encoding the solution (one line per color) */
pub fn solution_to_string(solution:&[Vec<VertexId>]) -> String {
    let mut res = String::default();
    for e in solution {
        for v in e {
            res += format!("{} ", v).as_str();
        }
        res += "\n";
    }
    res
}

/** writes a solution into a file. each line corresponds to a color. */
pub fn write_solution<P:AsRef<Path>>(filename:P, solution:&Solution) -> std::io::Result<()> {
    fs::write(filename, solution_to_string(solution))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_instance() {
        let (n,edges) = read_from_file("insts/grid2x2.col").unwrap();
        assert_eq!(n, 4);
        assert_eq!(edges.len(), 4);
        assert_eq!(edges[0], (0,1));
    }

    #[test]
    fn test_read_comments() {
        let s = "c this is a test comment\np edge 2 1\nc another one\ne 1 2\n";
        assert_eq!(read_from_str(s).unwrap(), (2, vec![(0,1)]));
    }

    #[test]
    fn test_read_header() {
        let s = "p edge 2 1";
        assert_eq!(read_header(s).unwrap(), ("", (2,1)));
    }

    #[test]
    fn test_read_header_col() {
        let s = "p col 12 7";
        assert_eq!(read_header(s).unwrap().1, (12,7));
    }

    #[test]
    fn test_read_edge() {
        let s = "e 1 2";
        assert_eq!(read_edge(s).unwrap().1, (1,2));
        assert_eq!(read_edge(s).unwrap().0, "");
    }

    #[test]
    fn test_windows_line_endings() {
        let s = "p edge 3 2\r\ne 1 2\r\ne 2 3\r\n";
        assert_eq!(read_from_str(s).unwrap(), (3, vec![(0,1),(1,2)]));
    }

    #[test]
    fn test_malformed_inputs() {
        assert!(matches!(read_from_str("e 1 2\n"), Err(LoadError::MissingHeader)));
        assert!(matches!(read_from_str("c nothing\n"), Err(LoadError::MissingHeader)));
        assert!(matches!(
            read_from_str("p edge 2 1\ne 1 3\n"),
            Err(LoadError::VertexOutOfRange { u:0, v:2, n:2 })
        ));
        assert!(matches!(
            read_from_str("p edge 2 1\ne 2 2\n"),
            Err(LoadError::SelfLoop(1))
        ));
        assert!(matches!(
            read_from_str("p edge 2 1\ne 0 1\n"),
            Err(LoadError::Parse { line:2, .. })
        ));
        assert!(matches!(
            read_from_str("p edge 2 1\ne 1 x\n"),
            Err(LoadError::Parse { line:2, .. })
        ));
        assert!(matches!(
            read_from_str("p edge 2 1\nq 1 2\n"),
            Err(LoadError::Parse { line:2, .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            read_from_file("insts/does-not-exist.col"),
            Err(LoadError::Io { .. })
        ));
    }

    #[test]
    fn test_solution_to_string() {
        assert_eq!(solution_to_string(&[vec![0,3], vec![1]]), "0 3 \n1 \n");
    }
}
