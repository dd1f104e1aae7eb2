use crate::bio::sequence::Sequence;
use crate::KerfError;
use flate2::read::GzDecoder;
use memmap2::Mmap;
use nom::{
    bytes::complete::{tag, take_till, take_while1},
    character::complete::{line_ending, not_line_ending},
    combinator::opt,
    sequence::preceded,
    IResult,
};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Residues per line when writing records back out.
const LINE_WIDTH: usize = 60;

/// Parse a FASTA header line into raw identifier and description bytes
fn parse_header(input: &[u8]) -> IResult<&[u8], (&[u8], Option<&[u8]>)> {
    let (input, _) = tag(b">")(input)?;
    let (input, id) = take_till(|c: u8| c == b' ' || c == b'\t' || c == b'\n' || c == b'\r')(input)?;
    let (input, description) = opt(preceded(
        take_while1(|c: u8| c == b' ' || c == b'\t'),
        not_line_ending,
    ))(input)?;
    let (input, _) = opt(line_ending)(input)?;
    Ok((input, (id, description.filter(|d: &&[u8]| !d.is_empty()))))
}

/// Parse sequence lines until next header or EOF.
///
/// Residues are kept verbatim: alignment case and gap symbols are significant
/// for identity scoring, so nothing is upper-cased or filtered except whitespace.
fn parse_sequence(input: &[u8]) -> IResult<&[u8], Vec<u8>> {
    let mut sequence = Vec::new();
    let mut remaining = input;

    while !remaining.is_empty() && remaining[0] != b'>' {
        let (rest, line) = take_till::<_, _, nom::error::Error<_>>(|c: u8| c == b'\n' || c == b'\r')(remaining)?;
        let (rest, _) = opt(line_ending)(rest)?;

        sequence.extend(line.iter().copied().filter(|c| !c.is_ascii_whitespace()));

        // A lone '\r' is not a line ending for nom; step over it.
        remaining = match rest.first() {
            Some(b'\r') => &rest[1..],
            _ => rest,
        };
    }

    Ok((remaining, sequence))
}

/// Header bytes and residues of one record, before text validation
struct RawRecord<'a> {
    id: &'a [u8],
    description: Option<&'a [u8]>,
    sequence: Vec<u8>,
}

/// Parse a single FASTA record
fn parse_record(input: &[u8]) -> IResult<&[u8], RawRecord<'_>> {
    let (input, (id, description)) = parse_header(input)?;
    let (input, sequence) = parse_sequence(input)?;
    Ok((
        input,
        RawRecord {
            id,
            description,
            sequence,
        },
    ))
}

impl RawRecord<'_> {
    /// Validate header text; `number` is the 1-based record position.
    fn into_sequence(self, number: usize) -> Result<Sequence, KerfError> {
        let id = std::str::from_utf8(self.id).map_err(|_| {
            KerfError::Parse(format!(
                "FASTA record {} has a non-UTF-8 identifier '{}'",
                number,
                String::from_utf8_lossy(self.id)
            ))
        })?;
        if id.is_empty() {
            return Err(KerfError::Parse(format!(
                "FASTA record {} has an empty identifier",
                number
            )));
        }

        let mut seq = Sequence::new(id.to_string(), self.sequence);
        if let Some(desc) = self.description {
            let desc = std::str::from_utf8(desc).map_err(|_| {
                KerfError::Parse(format!(
                    "FASTA record {} ('{}') has a non-UTF-8 description",
                    number, id
                ))
            })?;
            seq = seq.with_description(desc.to_string());
        }
        Ok(seq)
    }
}

/// Parse FASTA from bytes
pub fn parse_fasta_from_bytes(data: &[u8]) -> Result<Vec<Sequence>, KerfError> {
    let mut input = data;
    let mut sequences = Vec::new();

    loop {
        while !input.is_empty() && input[0].is_ascii_whitespace() {
            input = &input[1..];
        }

        if input.is_empty() {
            break;
        }

        if input[0] != b'>' {
            let line: String = String::from_utf8_lossy(input)
                .lines()
                .next()
                .unwrap_or_default()
                .chars()
                .take(40)
                .collect();
            return Err(KerfError::Parse(format!(
                "Expected a '>' header, found '{}'",
                line
            )));
        }

        match parse_record(input) {
            Ok((remaining, record)) => {
                sequences.push(record.into_sequence(sequences.len() + 1)?);
                input = remaining;
            }
            Err(e) => {
                return Err(KerfError::Parse(format!("Failed to parse FASTA: {:?}", e)));
            }
        }
    }

    Ok(sequences)
}

/// Parse a FASTA file into sequences (supports .gz compression)
pub fn parse_fasta<P: AsRef<Path>>(path: P) -> Result<Vec<Sequence>, KerfError> {
    let path = path.as_ref();

    if path.extension().and_then(|s| s.to_str()) == Some("gz") {
        parse_fasta_gzip(path)
    } else {
        parse_fasta_uncompressed(path)
    }
}

fn parse_fasta_uncompressed(path: &Path) -> Result<Vec<Sequence>, KerfError> {
    let file = File::open(path)?;
    // Mapping a zero-length file fails on some platforms
    if file.metadata()?.len() == 0 {
        return Ok(Vec::new());
    }
    let mmap = unsafe { Mmap::map(&file)? };

    parse_fasta_from_bytes(&mmap[..])
}

fn parse_fasta_gzip(path: &Path) -> Result<Vec<Sequence>, KerfError> {
    let file = File::open(path)?;
    let mut decoder = GzDecoder::new(BufReader::new(file));
    let mut buffer = Vec::new();
    decoder.read_to_end(&mut buffer)?;

    parse_fasta_from_bytes(&buffer)
}

/// Write sequences to a FASTA file (supports .gz compression)
pub fn write_fasta<'a, P, I>(path: P, sequences: I) -> Result<(), KerfError>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = &'a Sequence>,
{
    use flate2::write::GzEncoder;
    use flate2::Compression;

    let path = path.as_ref();
    let file = File::create(path)?;

    if path.extension().and_then(|s| s.to_str()) == Some("gz") {
        let encoder = GzEncoder::new(file, Compression::default());
        let mut writer = BufWriter::new(encoder);
        write_fasta_to_writer(&mut writer, sequences)?;
        writer.flush()?;
    } else {
        let mut writer = BufWriter::new(file);
        write_fasta_to_writer(&mut writer, sequences)?;
        writer.flush()?;
    }

    Ok(())
}

/// Write sequences to any writer
pub fn write_fasta_to_writer<'a, W, I>(writer: &mut W, sequences: I) -> Result<(), KerfError>
where
    W: Write,
    I: IntoIterator<Item = &'a Sequence>,
{
    for seq in sequences {
        writeln!(writer, "{}", seq.header())?;

        for chunk in seq.sequence.chunks(LINE_WIDTH) {
            writeln!(writer, "{}", String::from_utf8_lossy(chunk))?;
        }
    }
    Ok(())
}
