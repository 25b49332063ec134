//! # Binary codec of reaction records
//!
//! Big-endian frames, no header, one after another until the end of the stream:
//!
//! | field | encoding |
//! |---|---|
//! | name | u16 byte length + UTF-8 |
//! | logK | f64, EMPTY when unknown |
//! | DH slot | f64: enthalpy, EMPTY, [`ANALYTIC`] or [`LOOKUP`] |
//! | analytic | tMax f64, a0..a5 f64 (EMPTY when unset) |
//! | lookup | tMax f64, 5×14 f64 row by row |
//! | enthalpy | DCp f64 (EMPTY when unset), tMax f64 |
//! | reactants | i32 count, count × (name, f64 coefficient) |
//! | reference, comment | u16 byte length + UTF-8 each |
//!
//! The end of the stream is not an error: before a frame it ends the sequence,
//! inside a frame the partial frame is dropped with a warning.
use crate::Database::Complex::{ANALYTIC, Complex, EMPTY, LOOKUP, Reactant, is_empty_value};
use crate::Database::db_errors::BinaryError;
use crate::Thermodynamics::logK_extrapolation::{Extrapolation, LogKGrid};
use log::warn;
use std::io::{self, ErrorKind, Read, Write};

const MAX_REACTANTS: i32 = 100_000;

fn is_sentinel(x: f64, sentinel: f64) -> bool {
    (x - sentinel).abs() < 1e-3
}

////////////////////////////////WRITING////////////////////////////////

pub fn write_utf<W: Write>(w: &mut W, s: &str) -> io::Result<()> {
    let bytes = s.as_bytes();
    let len = u16::try_from(bytes.len()).map_err(|_| {
        io::Error::new(
            ErrorKind::InvalidInput,
            format!("string of {} bytes does not fit a u16 length", bytes.len()),
        )
    })?;
    w.write_all(&len.to_be_bytes())?;
    w.write_all(bytes)
}

fn write_f64<W: Write>(w: &mut W, x: f64) -> io::Result<()> {
    w.write_all(&x.to_be_bytes())
}

fn write_optional<W: Write>(w: &mut W, x: Option<f64>) -> io::Result<()> {
    write_f64(w, x.unwrap_or(EMPTY))
}

pub fn write_i32<W: Write>(w: &mut W, x: i32) -> io::Result<()> {
    w.write_all(&x.to_be_bytes())
}

/// Writes one frame.
pub fn write_complex<W: Write>(w: &mut W, c: &Complex) -> io::Result<()> {
    write_utf(w, &c.name)?;
    write_optional(w, c.constant)?;
    match &c.extrapolation {
        Extrapolation::Analytic(s) => {
            write_f64(w, ANALYTIC)?;
            write_f64(w, c.t_max)?;
            for a in s.a.iter() {
                write_optional(w, *a)?;
            }
        }
        Extrapolation::LookUp(g) => {
            write_f64(w, LOOKUP)?;
            write_f64(w, c.t_max)?;
            for row in 0..g.grid.nrows() {
                for col in 0..g.grid.ncols() {
                    write_f64(w, g.grid[(row, col)])?;
                }
            }
        }
        Extrapolation::DeltaHCp(d) => {
            write_optional(w, d.delta_h)?;
            write_optional(w, d.delta_cp)?;
            write_f64(w, c.t_max)?;
        }
    }
    let count = i32::try_from(c.reactants.len())
        .map_err(|_| io::Error::new(ErrorKind::InvalidInput, "too many reactants"))?;
    write_i32(w, count)?;
    for r in &c.reactants {
        write_utf(w, &r.name)?;
        write_f64(w, r.coef)?;
    }
    write_utf(w, &c.reference)?;
    write_utf(w, &c.comment)
}

////////////////////////////////READING////////////////////////////////

/// why a frame could not be read
pub(crate) enum ReadFail {
    /// stream ended; `true` when some bytes of the frame had already been read
    Eof(bool),
    Error(BinaryError),
}

/// reads fields of one frame and remembers whether anything was consumed
pub(crate) struct FrameReader<'a, R: Read> {
    inner: &'a mut R,
    started: bool,
}

impl<'a, R: Read> FrameReader<'a, R> {
    pub(crate) fn new(inner: &'a mut R) -> Self {
        Self {
            inner,
            started: false,
        }
    }

    fn bytes<const N: usize>(&mut self, field: &str) -> Result<[u8; N], ReadFail> {
        let mut buf = [0u8; N];
        let mut filled = 0;
        while filled < N {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => return Err(ReadFail::Eof(self.started || filled > 0)),
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(source) => {
                    return Err(ReadFail::Error(BinaryError::Io {
                        field: field.to_string(),
                        source,
                    }));
                }
            }
        }
        self.started = true;
        Ok(buf)
    }

    pub(crate) fn f64(&mut self, field: &str) -> Result<f64, ReadFail> {
        Ok(f64::from_be_bytes(self.bytes::<8>(field)?))
    }

    pub(crate) fn optional(&mut self, field: &str) -> Result<Option<f64>, ReadFail> {
        let x = self.f64(field)?;
        Ok(if is_empty_value(x) { None } else { Some(x) })
    }

    pub(crate) fn i32(&mut self, field: &str) -> Result<i32, ReadFail> {
        Ok(i32::from_be_bytes(self.bytes::<4>(field)?))
    }

    pub(crate) fn utf(&mut self, field: &str) -> Result<String, ReadFail> {
        let len = u16::from_be_bytes(self.bytes::<2>(field)?) as usize;
        let mut buf = vec![0u8; len];
        let mut filled = 0;
        while filled < len {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => return Err(ReadFail::Eof(true)),
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(source) => {
                    return Err(ReadFail::Error(BinaryError::Io {
                        field: field.to_string(),
                        source,
                    }));
                }
            }
        }
        String::from_utf8(buf).map_err(|e| {
            ReadFail::Error(BinaryError::Invalid {
                field: field.to_string(),
                message: e.to_string(),
            })
        })
    }

    pub(crate) fn count(&mut self, field: &str) -> Result<usize, ReadFail> {
        let n = self.i32(field)?;
        if !(0..=MAX_REACTANTS).contains(&n) {
            return Err(ReadFail::Error(BinaryError::Invalid {
                field: field.to_string(),
                message: format!("count {} out of range", n),
            }));
        }
        Ok(n as usize)
    }
}

fn read_frame<R: Read>(r: &mut FrameReader<'_, R>) -> Result<Complex, ReadFail> {
    let mut c = Complex::new(&r.utf("name")?);
    c.constant = r.optional("logK")?;
    let slot = r.f64("DH")?;
    if is_sentinel(slot, ANALYTIC) {
        c.t_max = r.f64("tMax")?;
        let mut a = [None; 6];
        for (i, x) in a.iter_mut().enumerate() {
            *x = r.optional(&format!("a{}", i))?;
        }
        c.extrapolation = Extrapolation::analytic(a);
    } else if is_sentinel(slot, LOOKUP) {
        c.t_max = r.f64("tMax")?;
        let mut grid = LogKGrid::from_element(f64::NAN);
        for row in 0..grid.nrows() {
            for col in 0..grid.ncols() {
                grid[(row, col)] = r.f64("logK grid")?;
            }
        }
        c.extrapolation = Extrapolation::lookup(grid);
    } else {
        let delta_h = if is_empty_value(slot) { None } else { Some(slot) };
        let delta_cp = r.optional("DCp")?;
        c.extrapolation = Extrapolation::delta_h_cp(delta_h, delta_cp);
        c.t_max = r.f64("tMax")?;
    }
    let count = r.count("nR")?;
    for k in 1..=count {
        let name = r.utf(&format!("R{}", k))?;
        let coef = r.f64(&format!("N{}", k))?;
        c.reactants.push(Reactant::new(&name, coef));
    }
    c.reference = r.utf("reference")?;
    c.comment = r.utf("comment")?;
    Ok(c)
}

/// Reads the next frame. `Ok(None)` at the end of the stream.
pub fn read_complex<R: Read>(reader: &mut R) -> Result<Option<Complex>, BinaryError> {
    let mut frame = FrameReader::new(reader);
    match read_frame(&mut frame) {
        Ok(c) => Ok(Some(c)),
        Err(ReadFail::Eof(false)) => Ok(None),
        Err(ReadFail::Eof(true)) => {
            warn!("binary database ends inside a record, the partial record is dropped");
            Ok(None)
        }
        Err(ReadFail::Error(e)) => Err(e),
    }
}

/// Writes all records to one stream.
pub fn write_all<W: Write>(w: &mut W, records: &[Complex]) -> io::Result<()> {
    for c in records {
        write_complex(w, c)?;
    }
    w.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn samples() -> Vec<Complex> {
        let mut with_notes = Complex::new("FeOH+")
            .with_constant(-9.5)
            .with_extrapolation(Extrapolation::delta_h_cp(Some(55.8), None))
            .with_reactant("Fe+2", 1.0)
            .with_reactant("H2O", 1.0)
            .with_reactant("H+", -1.0);
        with_notes.reference = "1976BAE".to_string();
        with_notes.comment = "estimated; see «notes»".to_string();
        let grid = LogKGrid::from_fn(|r, c| if r == 0 && c > 8 { f64::NAN } else { 0.1 * (r * 14 + c) as f64 });
        vec![
            with_notes,
            Complex::new("Empty"),
            Complex::new("CO2")
                .with_constant(-6.35)
                .with_extrapolation(Extrapolation::analytic([Some(-356.3), Some(-0.06), Some(21834.0), Some(126.8), Some(-1684915.0), None]))
                .with_reactant("HCO3-", 1.0)
                .with_reactant("H+", 1.0),
            Complex::new("AlOH+2")
                .with_extrapolation(Extrapolation::lookup(grid))
                .with_reactant("Al+3", 1.0)
                .with_reactant("", 2.0)
                .with_reactant("H2O", 0.0),
        ]
    }

    #[test]
    fn test_round_trip_of_all_shapes() {
        let records = samples();
        let mut buf = Vec::new();
        write_all(&mut buf, &records).unwrap();
        let mut cursor = Cursor::new(buf);
        for expected in &records {
            let c = read_complex(&mut cursor).unwrap().unwrap();
            assert!(expected.is_equal_to(&c), "{:?} != {:?}", expected, c);
        }
        assert!(read_complex(&mut cursor).unwrap().is_none());
        assert!(read_complex(&mut cursor).unwrap().is_none());
    }

    #[test]
    fn test_sentinels_in_the_enthalpy_slot() {
        let records = samples();
        let mut buf = Vec::new();
        write_complex(&mut buf, &records[2]).unwrap();
        let name_len = 2 + "CO2".len();
        let slot = f64::from_be_bytes(buf[name_len + 8..name_len + 16].try_into().unwrap());
        assert_eq!(slot, ANALYTIC);
        let mut buf = Vec::new();
        write_complex(&mut buf, &records[3]).unwrap();
        let name_len = 2 + "AlOH+2".len();
        let slot = f64::from_be_bytes(buf[name_len + 8..name_len + 16].try_into().unwrap());
        assert_eq!(slot, LOOKUP);
    }

    #[test]
    fn test_truncated_frame_ends_the_stream() {
        let mut buf = Vec::new();
        write_complex(&mut buf, &samples()[0]).unwrap();
        let full = buf.len();
        write_complex(&mut buf, &samples()[2]).unwrap();
        buf.truncate(full + 10);
        let mut cursor = Cursor::new(buf);
        assert!(read_complex(&mut cursor).unwrap().is_some());
        assert!(read_complex(&mut cursor).unwrap().is_none());
    }

    #[test]
    fn test_invalid_utf8_names_the_field() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&2u16.to_be_bytes());
        buf.extend_from_slice(&[0xff, 0xfe]);
        let err = read_complex(&mut Cursor::new(buf)).unwrap_err();
        assert_eq!(err.field(), "name");
    }

    #[test]
    fn test_negative_count_is_an_error() {
        let mut buf = Vec::new();
        write_utf(&mut buf, "X").unwrap();
        write_f64(&mut buf, 1.0).unwrap();
        write_f64(&mut buf, EMPTY).unwrap();
        write_f64(&mut buf, EMPTY).unwrap();
        write_f64(&mut buf, 25.0).unwrap();
        write_i32(&mut buf, -3).unwrap();
        let err = read_complex(&mut Cursor::new(buf)).unwrap_err();
        assert_eq!(err.field(), "nR");
    }

    #[test]
    fn test_oversized_string_is_refused() {
        let long = "x".repeat(70_000);
        let mut buf = Vec::new();
        assert!(write_utf(&mut buf, &long).is_err());
    }
}
