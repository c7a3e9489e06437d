//! Ultimately-periodic traces.
//!
//! A trace is written `letters[:rep[[weight]]]`, for instance `1,0;0,1:0`
//! or `1,0;0,1;1,1:-2[3]`. Letters are `;`-separated, and the fields of a
//! letter are `,`-separated. The repetition is the index where the loop of
//! the word starts, counted from the end if negative. It defaults to `-1`,
//! *i.e.* the last letter loops on itself. The weight defaults to `1`.

use crate::common::*;

/// An ultimately-periodic trace with fields of type `F`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace<F> {
    /// Letters, all of the same width.
    pub letters: Vec<Vec<F>>,
    /// Start of the loop, `rep < letters.len()`.
    pub rep: usize,
    /// Classification weight.
    pub weight: usize,
}

impl<F> Trace<F> {
    /// Constructor, checks the trace is well-formed.
    pub fn new(letters: Vec<Vec<F>>, rep: isize, weight: usize) -> Res<Self> {
        let size = letters.len();
        if size == 0 {
            bail!("empty trace")
        }
        let width = letters[0].len();
        if let Some((idx, letter)) = letters
            .iter()
            .enumerate()
            .find(|(_, letter)| letter.len() != width)
        {
            bail!(
                "letter {} has {} field(s), expected {} like the first one",
                idx,
                letter.len(),
                width
            )
        }
        let resolved = if rep < 0 { size as isize + rep } else { rep };
        if resolved < 0 || resolved >= size as isize {
            bail!(
                "illegal repetition {} for a trace with {} letter(s)",
                rep,
                size
            )
        }
        Ok(Trace {
            letters,
            rep: resolved as usize,
            weight,
        })
    }

    /// Parses a trace, `field` parses the fields of the letters.
    pub fn parse<P>(s: &str, field: P) -> Res<Self>
    where
        P: Fn(&str) -> Res<F>,
    {
        let s = s.trim();
        let (letters_str, tail) = match s.find(':') {
            Some(pos) => (&s[..pos], Some(s[pos + 1..].trim())),
            None => (s, None),
        };

        let mut letters = vec![];
        for letter in split_top(letters_str, ';') {
            let mut fields = vec![];
            for f in split_top(letter, ',') {
                fields.push(field(f.trim()).chain_err(|| format!("in letter `{}`", letter.trim()))?)
            }
            letters.push(fields)
        }

        let (rep, weight) = match tail {
            None => (-1, 1),
            Some(tail) => {
                let (rep_str, weight_str) = match tail.find('[') {
                    Some(pos) => {
                        let weight = tail[pos + 1..].trim();
                        match weight.strip_suffix(']') {
                            Some(weight) => (tail[..pos].trim(), Some(weight.trim())),
                            None => bail!("unclosed weight bracket in `{}`", tail),
                        }
                    }
                    None => (tail, None),
                };
                let rep = if rep_str.is_empty() {
                    -1
                } else {
                    rep_str
                        .parse::<isize>()
                        .chain_err(|| format!("illegal repetition `{}`", rep_str))?
                };
                let weight = match weight_str {
                    None => 1,
                    Some(w) => match w.parse::<usize>() {
                        Ok(w) if w > 0 => w,
                        _ => bail!("illegal weight `{}`, expected a positive integer", w),
                    },
                };
                (rep, weight)
            }
        };

        Self::new(letters, rep, weight)
    }

    /// Number of letters.
    #[inline]
    pub fn size(&self) -> usize {
        self.letters.len()
    }
    /// Length of the loop.
    #[inline]
    pub fn period(&self) -> usize {
        self.size() - self.rep
    }
    /// Number of fields of the letters.
    #[inline]
    pub fn width(&self) -> usize {
        self.letters[0].len()
    }
}

/// Splits a string on a separator, ignoring separators inside brackets or
/// parentheses.
pub fn split_top(s: &str, sep: char) -> Vec<&str> {
    let mut res = vec![];
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, c) in s.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            c if c == sep && depth == 0 => {
                res.push(&s[start..idx]);
                start = idx + c.len_utf8()
            }
            _ => (),
        }
    }
    res.push(&s[start..]);
    res
}

/// Size of the largest trace and maximal period of some traces.
///
/// The maximal period is the largest prefix plus the least common multiple
/// of the periods: past it, all the traces are in their loop and back at
/// their starting phase.
pub fn sample_metrics<'a, F: 'a, I>(traces: I) -> (usize, usize)
where
    I: IntoIterator<Item = &'a Trace<F>>,
{
    let (mut max_size, mut max_prefix, mut periods) = (0, 0, 0);
    for trace in traces {
        max_size = ::std::cmp::max(max_size, trace.size());
        max_prefix = ::std::cmp::max(max_prefix, trace.rep);
        periods = lcm(periods, trace.period())
    }
    (max_size, max_prefix + periods)
}

/// Parses an LTL field, `0`/`1` or `false`/`true`.
pub fn bool_field(s: &str) -> Res<bool> {
    match s {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => bail!("illegal boolean field `{}`", s),
    }
}

/// An interval `[lo, hi]` of rationals.
pub type Interval = (Rat, Rat);

/// Parses an SLTL field, a number or an interval `[lo, hi]`.
pub fn interval_field(s: &str) -> Res<Interval> {
    let num = |s: &str| -> Res<Rat> {
        parse_decimal(s.trim()).ok_or_else(|| format!("illegal number `{}`", s.trim()).into())
    };
    if let Some(inner) = s.strip_prefix('[') {
        let inner = match inner.strip_suffix(']') {
            Some(inner) => inner,
            None => bail!("unclosed interval `{}`", s),
        };
        let bounds = split_top(inner, ',');
        if bounds.len() != 2 {
            bail!("illegal interval `{}`, expected `[lo, hi]`", s)
        }
        let (lo, hi) = (num(bounds[0])?, num(bounds[1])?);
        if lo > hi {
            bail!("empty interval `{}`", s)
        }
        Ok((lo, hi))
    } else {
        let val = num(s)?;
        Ok((val.clone(), val))
    }
}
