use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

/// Minimal SVG document builder
pub struct SvgWriter {
    writer: Writer<Vec<u8>>,
}

impl SvgWriter {
    pub fn new(width: u32, height: u32) -> Result<Self, quick_xml::Error> {
        let mut writer = Writer::new(Vec::with_capacity(4096));
        let (width, height) = (width.to_string(), height.to_string());
        let view_box = format!("0 0 {width} {height}");

        let mut root = BytesStart::new("svg");
        root.push_attribute(("xmlns", "http://www.w3.org/2000/svg"));
        root.push_attribute(("width", width.as_str()));
        root.push_attribute(("height", height.as_str()));
        root.push_attribute(("viewBox", view_box.as_str()));
        root.push_attribute(("font-family", "sans-serif"));
        writer.write_event(Event::Start(root))?;

        let mut svg = SvgWriter { writer };
        svg.empty(
            "rect",
            &[
                ("x", "0"),
                ("y", "0"),
                ("width", width.as_str()),
                ("height", height.as_str()),
                ("fill", "white"),
            ],
        )?;
        Ok(svg)
    }

    pub fn rect(
        &mut self,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        fill: &str,
    ) -> Result<(), quick_xml::Error> {
        self.empty(
            "rect",
            &[
                ("x", coord(x).as_str()),
                ("y", coord(y).as_str()),
                ("width", coord(w).as_str()),
                ("height", coord(h).as_str()),
                ("fill", fill),
            ],
        )
    }

    pub fn line(
        &mut self,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        stroke: &str,
    ) -> Result<(), quick_xml::Error> {
        self.empty(
            "line",
            &[
                ("x1", coord(x1).as_str()),
                ("y1", coord(y1).as_str()),
                ("x2", coord(x2).as_str()),
                ("y2", coord(y2).as_str()),
                ("stroke", stroke),
                ("stroke-width", "1"),
            ],
        )
    }

    pub fn polyline(
        &mut self,
        points: &[(f64, f64)],
        stroke: &str,
    ) -> Result<(), quick_xml::Error> {
        let points = points
            .iter()
            .map(|&(x, y)| format!("{},{}", coord(x), coord(y)))
            .collect::<Vec<_>>()
            .join(" ");
        self.empty(
            "polyline",
            &[
                ("points", points.as_str()),
                ("fill", "none"),
                ("stroke", stroke),
                ("stroke-width", "2"),
            ],
        )
    }

    pub fn circle(&mut self, cx: f64, cy: f64, r: f64, fill: &str) -> Result<(), quick_xml::Error> {
        self.empty(
            "circle",
            &[
                ("cx", coord(cx).as_str()),
                ("cy", coord(cy).as_str()),
                ("r", coord(r).as_str()),
                ("fill", fill),
            ],
        )
    }

    pub fn path(&mut self, d: &str, fill: &str) -> Result<(), quick_xml::Error> {
        self.empty(
            "path",
            &[("d", d), ("fill", fill), ("stroke", "white"), ("stroke-width", "1")],
        )
    }

    pub fn text(
        &mut self,
        x: f64,
        y: f64,
        size: u32,
        anchor: Anchor,
        content: &str,
    ) -> Result<(), quick_xml::Error> {
        self.text_element(
            &[
                ("x", coord(x).as_str()),
                ("y", coord(y).as_str()),
                ("font-size", size.to_string().as_str()),
                ("text-anchor", anchor.as_str()),
            ],
            content,
        )
    }

    /// Text rotated by `angle` degrees around its anchor point
    pub fn rotated_text(
        &mut self,
        x: f64,
        y: f64,
        angle: f64,
        content: &str,
    ) -> Result<(), quick_xml::Error> {
        let (x, y) = (coord(x), coord(y));
        let transform = format!("rotate({angle} {x} {y})");
        self.text_element(
            &[
                ("x", x.as_str()),
                ("y", y.as_str()),
                ("font-size", "11"),
                ("text-anchor", "end"),
                ("transform", transform.as_str()),
            ],
            content,
        )
    }

    pub fn finish(mut self) -> Result<String, quick_xml::Error> {
        self.writer.write_event(Event::End(BytesEnd::new("svg")))?;
        let bytes = self.writer.into_inner();
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), quick_xml::Error> {
        let mut elem = BytesStart::new(name);
        elem.extend_attributes(attrs.iter().copied());
        self.writer.write_event(Event::Empty(elem))?;
        Ok(())
    }

    fn text_element(
        &mut self,
        attrs: &[(&str, &str)],
        content: &str,
    ) -> Result<(), quick_xml::Error> {
        let mut elem = BytesStart::new("text");
        elem.extend_attributes(attrs.iter().copied());
        self.writer.write_event(Event::Start(elem))?;
        self.writer.write_event(Event::Text(BytesText::new(content)))?;
        self.writer.write_event(Event::End(BytesEnd::new("text")))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

impl Anchor {
    fn as_str(self) -> &'static str {
        match self {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
            Anchor::End => "end",
        }
    }
}

fn coord(v: f64) -> String {
    format!("{v:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_is_escaped() {
        let mut svg = SvgWriter::new(10, 10).unwrap();
        svg.text(1.0, 2.0, 12, Anchor::Middle, "A & <B>").unwrap();
        let doc = svg.finish().unwrap();
        assert!(doc.contains("A &amp; &lt;B&gt;"));
        assert!(doc.starts_with("<svg"));
        assert!(doc.ends_with("</svg>"));
    }

    #[test]
    fn test_attributes_are_escaped() {
        let mut svg = SvgWriter::new(10, 10).unwrap();
        svg.rect(0.0, 0.0, 1.0, 1.0, "a\"b").unwrap();
        let doc = svg.finish().unwrap();
        assert!(doc.contains(r#"fill="a&quot;b""#));
        assert!(doc.contains(r#"<rect x="0.00" y="0.00" width="1.00" height="1.00""#));
    }
}
