use serde_json::{Map, Value};

use super::{json, number, take_f64, take_json, take_string, take_u32, text, Extension, FieldSpec};
use crate::model::{BlockShape, VideoScrollFields};

const FIELDS: &[FieldSpec] = &[
    text("videoSrc"),
    text("videoSrcMobile"),
    text("imagePrefix"),
    text("imagePrefixMobile"),
    text("frameExtension"),
    number("totalFrames"),
    number("totalFramesMobile"),
    number("frameStart"),
    number("frameEnd"),
    number("startTime"),
    number("endTime"),
    number("fps"),
    text("height"),
    json("steps"),
    json("fallbackFrames"),
];

pub static EXTENSION: Extension = Extension {
    types: &["videoscrollytelling", "videoscroll", "scrollvideo"],
    fields: FIELDS,
    build,
};

fn build(map: &mut Map<String, Value>) -> BlockShape {
    BlockShape::VideoScroll(VideoScrollFields {
        video_src: take_string(map, "videoSrc"),
        video_src_mobile: take_string(map, "videoSrcMobile"),
        image_prefix: take_string(map, "imagePrefix"),
        image_prefix_mobile: take_string(map, "imagePrefixMobile"),
        frame_extension: take_string(map, "frameExtension"),
        total_frames: take_u32(map, "totalFrames"),
        total_frames_mobile: take_u32(map, "totalFramesMobile"),
        frame_start: take_u32(map, "frameStart"),
        frame_end: take_u32(map, "frameEnd"),
        start_time: take_f64(map, "startTime"),
        end_time: take_f64(map, "endTime"),
        fps: take_f64(map, "fps"),
        height: take_string(map, "height"),
        steps: take_json(map, "steps"),
        fallback_frames: take_json(map, "fallbackFrames"),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::parser::fields::extract_block;
    use crate::parser::{Diagnostics, ParseOptions};

    #[test]
    fn video_scroll_fields() {
        let record = "type: videoscrollytelling\n\
                      videoSrc: https://cdn.example.com/v.mp4\n\
                      startTime: 0\nendTime: 12,5\nfps: 24\n\
                      totalFrames: 300\nheight: 400vh\n\
                      steps: [{time: 0, text: 'Primeiro'}, {time: 6.2, text: 'Segundo',}]\n\
                      caption: Fonte: NASA";
        let block = extract_block(record, &ParseOptions::default(), &mut Diagnostics::default()).unwrap();
        let video = block.video_scroll().unwrap();
        assert_eq!(video.video_src.as_deref(), Some("https://cdn.example.com/v.mp4"));
        assert_eq!(video.start_time, Some(0.0));
        assert_eq!(video.end_time, Some(12.5));
        assert_eq!(video.fps, Some(24.0));
        assert_eq!(video.total_frames, Some(300));
        assert_eq!(video.height.as_deref(), Some("400vh"));
        assert_eq!(
            video.steps,
            Some(json!([{"time": 0, "text": "Primeiro"}, {"time": 6.2, "text": "Segundo"}]))
        );
        assert_eq!(block.fields.get("caption"), Some(&json!("Fonte: NASA")));
    }

    #[test]
    fn media_pipeline_can_write_back() {
        let mut block = extract_block(
            "type: videoscrollytelling\nvideoSrc: v.mp4",
            &ParseOptions::default(),
            &mut Diagnostics::default(),
        )
        .unwrap();
        if let Some(video) = block.video_scroll_mut() {
            video.image_prefix = Some("https://cdn.example.com/frames/v_".into());
            video.total_frames = Some(181);
        }
        let out = serde_json::to_value(&block).unwrap();
        assert_eq!(out["imagePrefix"], json!("https://cdn.example.com/frames/v_"));
        assert_eq!(out["totalFrames"], json!(181));
    }
}
