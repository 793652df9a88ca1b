use std::fs;
use std::io::Write;
use std::path::PathBuf;

use log::{debug, info};

/// One RGB8 video frame. Pixels are stored row-major, three bytes per pixel.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

pub type Colour = (u8, u8, u8);

impl Frame {
    pub fn new(width: usize, height: usize) -> Self {
        Frame {
            width,
            height,
            data: vec![0; width * height * 3],
        }
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, colour: Colour) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let offset = (y as usize * self.width + x as usize) * 3;
        self.data[offset] = colour.0;
        self.data[offset + 1] = colour.1;
        self.data[offset + 2] = colour.2;
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Colour> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y * self.width + x) * 3;
        Some((self.data[offset], self.data[offset + 1], self.data[offset + 2]))
    }
}

/// External frame supplier (file decode, live camera, synthetic scene).
/// `next_frame` returns `None` on end-of-stream.
pub trait FrameSource {
    fn next_frame(&mut self) -> Option<Frame>;
}

/// Consumer for annotated output frames. Container encoding is outside this
/// crate; the bundled sink writes a numbered PPM sequence.
pub trait FrameSink {
    fn write_frame(&mut self, frame: &Frame) -> anyhow::Result<()>;
}

pub struct PpmSequenceWriter {
    output_dir: PathBuf,
    frames_written: usize,
}

impl PpmSequenceWriter {
    pub fn new(output_dir: &str) -> anyhow::Result<Self> {
        fs::create_dir_all(output_dir)?;
        info!("Writing annotated frames to \"{}\"", output_dir);
        Ok(PpmSequenceWriter {
            output_dir: PathBuf::from(output_dir),
            frames_written: 0,
        })
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }
}

impl FrameSink for PpmSequenceWriter {
    fn write_frame(&mut self, frame: &Frame) -> anyhow::Result<()> {
        let path = self
            .output_dir
            .join(format!("frame_{:05}.ppm", self.frames_written));
        let mut file = fs::File::create(&path)?;
        write!(file, "P6\n{} {}\n255\n", frame.width, frame.height)?;
        file.write_all(&frame.data)?;
        debug!("Wrote frame to {:?}", path);
        self.frames_written += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_pixel_ignores_out_of_bounds() {
        let mut frame = Frame::new(4, 4);
        frame.set_pixel(-1, 0, (255, 255, 255));
        frame.set_pixel(0, 4, (255, 255, 255));
        assert!(frame.data.iter().all(|&b| b == 0));

        frame.set_pixel(3, 3, (10, 20, 30));
        assert_eq!(frame.pixel(3, 3), Some((10, 20, 30)));
    }
}
