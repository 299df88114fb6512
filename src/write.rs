use std::{
    collections::BTreeMap,
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

use byteorder::{BigEndian, WriteBytesExt};
use indexmap::IndexMap;
use serde::Serialize;
use tiff::encoder::{TiffEncoder, colortype};
use tiff_encoder::{LONG, RATIONAL, SHORT, TiffFile, ifd::{Ifd, tags}, write::ByteBlock};

use crate::{error::Result, render::{RenderedSlice, SliceMetadata}};

#[derive(Debug, clap::ValueEnum, Clone, Copy, PartialEq, Eq)]
pub enum Endianess {
    Big,
    Native,
}

pub fn write_tiff(filename: &Path, image: &RenderedSlice, endianess: Endianess) -> Result<()> {
    match endianess {
        Endianess::Big => write_tiff_big_endian(filename, &image.pixels, image.width, image.height),
        Endianess::Native => {
            write_tiff_native_endian(filename, &image.pixels, image.width, image.height)
        }
    }
}

pub fn write_tiff_native_endian(
    filename: &Path,
    data: &[f32],
    width: usize,
    height: usize,
) -> Result<()> {
    let mut out_file = File::create(filename)?;
    let mut tiff = TiffEncoder::new(&mut out_file)?;
    tiff.write_image::<colortype::Gray32Float>(width as u32, height as u32, data)?;
    Ok(())
}

pub fn write_tiff_big_endian(
    filename: &Path,
    data: &[f32],
    width: usize,
    height: usize,
) -> Result<()> {
    let mut image_bytes: Vec<u8> = Vec::with_capacity(width * height * 4);
    for value in data.iter() {
        image_bytes.write_f32::<BigEndian>(*value)?;
    }

    TiffFile::new(
        Ifd::new()
            .with_entry(tags::PhotometricInterpretation, SHORT![1]) // Black is zero
            .with_entry(tags::Compression, SHORT![1]) // No compression

            .with_entry(tags::BitsPerSample, SHORT![32])
            .with_entry(tags::SamplesPerPixel, SHORT![1])
            .with_entry(tags::SampleFormat, SHORT![3]) // IEEE float

            .with_entry(tags::ImageLength, LONG![height as u32])
            .with_entry(tags::ImageWidth, LONG![width as u32])

            .with_entry(tags::ResolutionUnit, SHORT![1]) // No resolution unit
            .with_entry(tags::XResolution, RATIONAL![(1, 1)])
            .with_entry(tags::YResolution, RATIONAL![(1, 1)])

            .with_entry(tags::RowsPerStrip, LONG![height as u32]) // One strip for the whole image
            .with_entry(tags::StripByteCounts, LONG![image_bytes.len() as u32])
            .with_entry(tags::StripOffsets, ByteBlock::single(image_bytes))
            .single()
    ).with_endianness(tiff_encoder::write::Endianness::MM).write_to(filename)?;

    Ok(())
}

/// Per-snapshot entry of `metadata.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SnapshotMetadata {
    pub files: IndexMap<String, SliceMetadata>,
    pub header: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    pub postprocess_dir: PathBuf,
    #[serde(flatten)]
    pub snapshots: BTreeMap<String, SnapshotMetadata>,
}

pub fn write_metadata(filename: &Path, metadata: &Metadata) -> Result<()> {
    let writer = BufWriter::new(File::create(filename)?);
    serde_json::to_writer_pretty(writer, metadata)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::render;

    fn image() -> RenderedSlice {
        let slab = ndarray::array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        render(slab.view(), "Electric_Field_Ex", false, 1.0, [0.0, 1.0, 0.0, 2.0])
    }

    #[test]
    fn native_tiff_decodes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slice.tif");
        write_tiff(&path, &image(), Endianess::Native).unwrap();

        let mut decoder = tiff::decoder::Decoder::new(File::open(&path).unwrap()).unwrap();
        assert_eq!(decoder.dimensions().unwrap(), (2, 3));
        match decoder.read_image().unwrap() {
            tiff::decoder::DecodingResult::F32(pixels) => {
                assert_eq!(pixels, [5.0, 6.0, 3.0, 4.0, 1.0, 2.0])
            }
            _ => panic!("expected float pixels"),
        }
    }

    #[test]
    fn big_endian_tiff_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slice.tif");
        write_tiff(&path, &image(), Endianess::Big).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], b"MM");
        assert!(bytes.len() > 6 * 4);
    }

    #[test]
    fn metadata_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata.json");
        let mut files = IndexMap::new();
        files.insert("Electric_Field_Ex_x_slice_1.0_nano".to_string(), image().metadata);
        let metadata = Metadata {
            postprocess_dir: dir.path().to_owned(),
            snapshots: BTreeMap::from([(
                "0001".to_string(),
                SnapshotMetadata {
                    files,
                    header: Some(serde_json::json!({"step": 1})),
                },
            )]),
        };
        write_metadata(&path, &metadata).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(json["postprocess_dir"].is_string());
        let entry = &json["0001"]["files"]["Electric_Field_Ex_x_slice_1.0_nano"];
        assert_eq!(entry["vmax"], 6.0);
        assert_eq!(entry["cmap"], "seismic");
        assert_eq!(json["0001"]["header"]["step"], 1);
    }
}
