//! tmg 2.0 serialization of matched subgraphs.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use waymap_core::model::HighwayData;
use waymap_core::util::fmt_g;

use crate::edge::EdgeId;
use crate::error::GraphError;
use crate::graph::HighwayGraph;
use crate::subgraph::{GraphFormat, GraphListEntry};
use crate::vertex::VertexId;

impl HighwayGraph {
    /// write the three graph files for one descriptor trio (simple,
    /// collapsed, traveled) and record their vertex/edge counts back
    /// into the descriptors.
    pub fn write_subgraph_tmg(
        &self,
        data: &HighwayData,
        entries: &mut [GraphListEntry],
        directory: &Path,
        traveler_names: &[String],
    ) -> Result<(), GraphError> {
        let matched = self.matching_subgraph(data, &entries[0]);
        for entry in entries.iter_mut() {
            let filename = directory.join(entry.filename());
            let mut write = || -> std::io::Result<()> {
                let mut out = BufWriter::new(File::create(&filename)?);
                match entry.format {
                    GraphFormat::Simple => {
                        let numbering = self.write_header_and_vertices(
                            &mut out,
                            "simple",
                            &matched.vertices,
                            matched.simple_edges.len(),
                            0,
                            None,
                        )?;
                        for &e in &matched.simple_edges {
                            let edge = self.edge(e);
                            writeln!(
                                out,
                                "{} {} {}",
                                numbering[&edge.vertex1],
                                numbering[&edge.vertex2],
                                edge.label(entry.systems.as_deref())
                            )?;
                        }
                        entry.vertices = matched.vertices.len();
                        entry.edges = matched.simple_edges.len();
                    }
                    GraphFormat::Collapsed => {
                        let visible: Vec<VertexId> = matched
                            .vertices
                            .iter()
                            .copied()
                            .filter(|&v| self.vertex(v).visibility >= 2)
                            .collect();
                        let numbering = self.write_header_and_vertices(
                            &mut out,
                            "collapsed",
                            &visible,
                            matched.collapsed_edges.len(),
                            0,
                            None,
                        )?;
                        for &e in &matched.collapsed_edges {
                            self.write_edge_line(&mut out, e, &numbering, entry, data, None)?;
                        }
                        entry.vertices = visible.len();
                        entry.edges = matched.collapsed_edges.len();
                    }
                    GraphFormat::Traveled => {
                        let traveled: Vec<VertexId> = matched
                            .vertices
                            .iter()
                            .copied()
                            .filter(|&v| self.vertex(v).visibility >= 1)
                            .collect();
                        let numbering = self.write_header_and_vertices(
                            &mut out,
                            "traveled",
                            &traveled,
                            matched.traveled_edges.len(),
                            traveler_names.len(),
                            Some(traveler_names),
                        )?;
                        for &e in &matched.traveled_edges {
                            self.write_edge_line(
                                &mut out,
                                e,
                                &numbering,
                                entry,
                                data,
                                Some(traveler_names.len()),
                            )?;
                        }
                        writeln!(out, "{}", traveler_names.join(" "))?;
                        entry.vertices = traveled.len();
                        entry.edges = matched.traveled_edges.len();
                        entry.travelers = traveler_names.len();
                    }
                }
                Ok(())
            };
            write().map_err(|source| GraphError::FileWrite {
                path: filename.display().to_string(),
                source,
            })?;
        }
        Ok(())
    }

    fn write_header_and_vertices(
        &self,
        out: &mut impl Write,
        format: &str,
        vertices: &[VertexId],
        edge_count: usize,
        traveler_count: usize,
        travelers: Option<&[String]>,
    ) -> std::io::Result<HashMap<VertexId, usize>> {
        writeln!(out, "TMG 2.0 {format}")?;
        if travelers.is_some() {
            writeln!(out, "{} {} {}", vertices.len(), edge_count, traveler_count)?;
        } else {
            writeln!(out, "{} {}", vertices.len(), edge_count)?;
        }
        let mut numbering = HashMap::with_capacity(vertices.len());
        for (num, &v) in vertices.iter().enumerate() {
            let vertex = self.vertex(v);
            writeln!(
                out,
                "{} {} {}",
                vertex.unique_name,
                fmt_g(vertex.lat),
                fmt_g(vertex.lng)
            )?;
            numbering.insert(v, num);
        }
        Ok(numbering)
    }

    fn write_edge_line(
        &self,
        out: &mut impl Write,
        e: EdgeId,
        numbering: &HashMap<VertexId, usize>,
        entry: &GraphListEntry,
        data: &HighwayData,
        traveler_universe: Option<usize>,
    ) -> std::io::Result<()> {
        let edge = self.edge(e);
        write!(
            out,
            "{} {} {}",
            numbering[&edge.vertex1],
            numbering[&edge.vertex2],
            edge.label(entry.systems.as_deref())
        )?;
        if let Some(universe) = traveler_universe {
            write!(
                out,
                " {}",
                data.segment(edge.segment).clinched_by.hex_code(universe)
            )?;
        }
        for &i in &edge.intermediate_points {
            let v = self.vertex(i);
            write!(out, " {} {}", fmt_g(v.lat), fmt_g(v.lng))?;
        }
        writeln!(out)
    }
}
